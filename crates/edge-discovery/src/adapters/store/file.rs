use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::domain::{Record, StoreError};
use crate::ports::RecordStore;

/// JSON file-backed record store.
///
/// The whole map lives in memory and is rewritten to disk on every
/// mutation through a temp file and a rename, so a crash leaves either the
/// old or the new file. The write lock is held across the rewrite and the
/// map only changes once the file has been replaced.
pub struct JsonFileRecordStore<R> {
    data: RwLock<HashMap<String, R>>,
    path: PathBuf,
}

impl<R: Record> JsonFileRecordStore<R> {
    /// Open the store at `path`. A missing, unreadable or corrupt file
    /// starts an empty store.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();

        let data = match Self::load_from_file(&path) {
            Ok(data) => {
                tracing::debug!(path = %path.display(), records = data.len(), "Loaded record store");
                data
            }
            Err(e) => {
                if path.exists() {
                    tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable record store");
                }
                HashMap::new()
            }
        };

        Self {
            data: RwLock::new(data),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_file(path: &Path) -> Result<HashMap<String, R>, StoreError> {
        let bytes = fs::read(path).map_err(|e| StoreError::Io(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn save_to_file(&self, data: &HashMap<String, R>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }

        let bytes =
            serde_json::to_vec_pretty(data).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| StoreError::Io(e.to_string()))?;
        file.write_all(&bytes)
            .map_err(|e| StoreError::Io(e.to_string()))?;
        file.sync_all().map_err(|e| StoreError::Io(e.to_string()))?;

        fs::rename(&temp_path, &self.path).map_err(|e| StoreError::Io(e.to_string()))
    }
}

impl<R: Record> RecordStore<R> for JsonFileRecordStore<R> {
    fn get(&self, key: &str) -> Result<R, StoreError> {
        self.data
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn set(&self, record: R) -> Result<(), StoreError> {
        let mut data = self.data.write();
        let mut next = data.clone();
        next.insert(record.key().to_string(), record);
        self.save_to_file(&next)?;
        *data = next;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut data = self.data.write();
        if !data.contains_key(key) {
            return Ok(());
        }
        let mut next = data.clone();
        next.remove(key);
        self.save_to_file(&next)?;
        *data = next;
        Ok(())
    }

    fn list(&self) -> Result<Vec<R>, StoreError> {
        Ok(self.data.read().values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NetworkRecord;

    fn record(id: &str, ip: &str) -> NetworkRecord {
        NetworkRecord {
            id: id.to_string(),
            ipv4: vec![ip.to_string()],
            rtt: 0.0,
        }
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.json");

        {
            let store = JsonFileRecordStore::open(&path);
            store.set(record("a", "10.0.0.1")).unwrap();
            store.set(record("b", "10.0.0.2")).unwrap();
            store.delete("b").unwrap();
        }

        let store: JsonFileRecordStore<NetworkRecord> = JsonFileRecordStore::open(&path);
        assert_eq!(store.get("a").unwrap(), record("a", "10.0.0.1"));
        assert!(matches!(store.get("b"), Err(StoreError::NotFound(_))));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.json");
        fs::write(&path, b"{ not json").unwrap();

        let store: JsonFileRecordStore<NetworkRecord> = JsonFileRecordStore::open(&path);
        assert!(store.list().unwrap().is_empty());

        store.set(record("a", "10.0.0.1")).unwrap();
        let reopened: JsonFileRecordStore<NetworkRecord> = JsonFileRecordStore::open(&path);
        assert_eq!(reopened.list().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_save_leaves_map_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("db");
        let store = JsonFileRecordStore::open(sub.join("network.json"));
        store.set(record("a", "10.0.0.1")).unwrap();

        // A plain file where the store directory was makes every save fail
        fs::remove_dir_all(&sub).unwrap();
        fs::write(&sub, b"").unwrap();

        assert!(matches!(
            store.set(record("b", "10.0.0.2")),
            Err(StoreError::Io(_))
        ));
        assert!(matches!(store.get("b"), Err(StoreError::NotFound(_))));

        assert!(matches!(store.delete("a"), Err(StoreError::Io(_))));
        assert_eq!(store.get("a").unwrap(), record("a", "10.0.0.1"));
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_file_uses_wire_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.json");

        let store = JsonFileRecordStore::open(&path);
        store.set(record("a", "10.0.0.1")).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"IPv4\""));
        assert!(raw.contains("\"RTT\""));
    }
}
