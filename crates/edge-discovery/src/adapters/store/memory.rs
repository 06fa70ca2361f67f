use std::collections::HashMap;

use parking_lot::RwLock;

use crate::domain::{Record, StoreError};
use crate::ports::RecordStore;

/// In-memory record store.
///
/// Used when no store directory is configured and by tests.
pub struct InMemoryRecordStore<R> {
    data: RwLock<HashMap<String, R>>,
}

impl<R> InMemoryRecordStore<R> {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }
}

impl<R> Default for InMemoryRecordStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> RecordStore<R> for InMemoryRecordStore<R> {
    fn get(&self, key: &str) -> Result<R, StoreError> {
        self.data
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn set(&self, record: R) -> Result<(), StoreError> {
        self.data.write().insert(record.key().to_string(), record);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.data.write().remove(key);
        Ok(())
    }

    fn list(&self) -> Result<Vec<R>, StoreError> {
        Ok(self.data.read().values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ServiceRecord;

    fn record(id: &str, services: &[&str]) -> ServiceRecord {
        ServiceRecord {
            id: id.to_string(),
            services: services.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_get_set_delete() {
        let store = InMemoryRecordStore::new();

        store.set(record("a", &["ls"])).unwrap();
        assert_eq!(store.get("a").unwrap(), record("a", &["ls"]));

        store.set(record("a", &["vlc"])).unwrap();
        assert_eq!(store.get("a").unwrap().services, vec!["vlc"]);

        store.delete("a").unwrap();
        assert_eq!(store.get("a"), Err(StoreError::NotFound("a".into())));
    }

    #[test]
    fn test_delete_absent_is_ok() {
        let store: InMemoryRecordStore<ServiceRecord> = InMemoryRecordStore::new();
        assert!(store.delete("missing").is_ok());
    }

    #[test]
    fn test_list() {
        let store = InMemoryRecordStore::new();
        store.set(record("a", &[])).unwrap();
        store.set(record("b", &[])).unwrap();

        let mut ids: Vec<_> = store.list().unwrap().into_iter().map(|r| r.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
