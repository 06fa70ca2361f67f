//! Keyed record store adapters.

mod file;
mod memory;

pub use file::JsonFileRecordStore;
pub use memory::InMemoryRecordStore;

use std::path::Path;
use std::sync::Arc;

use crate::domain::{ConfigurationRecord, NetworkRecord, ServiceRecord, SystemEntry};
use crate::ports::RegistryStores;

impl RegistryStores {
    /// Four empty in-memory stores.
    pub fn in_memory() -> Self {
        Self {
            identity: Arc::new(InMemoryRecordStore::<SystemEntry>::new()),
            configuration: Arc::new(InMemoryRecordStore::<ConfigurationRecord>::new()),
            network: Arc::new(InMemoryRecordStore::<NetworkRecord>::new()),
            service: Arc::new(InMemoryRecordStore::<ServiceRecord>::new()),
        }
    }

    /// Four JSON file stores under `dir`, one file each.
    pub fn open_dir(dir: &Path) -> Self {
        Self {
            identity: Arc::new(JsonFileRecordStore::<SystemEntry>::open(
                dir.join("system.json"),
            )),
            configuration: Arc::new(JsonFileRecordStore::<ConfigurationRecord>::open(
                dir.join("configuration.json"),
            )),
            network: Arc::new(JsonFileRecordStore::<NetworkRecord>::open(
                dir.join("network.json"),
            )),
            service: Arc::new(JsonFileRecordStore::<ServiceRecord>::open(
                dir.join("service.json"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ID_KEY;

    #[test]
    fn test_open_dir_persists_each_store() {
        let dir = tempfile::tempdir().unwrap();

        let stores = RegistryStores::open_dir(dir.path());
        stores.identity.set(SystemEntry::new(ID_KEY, "edge-orchestration-a")).unwrap();
        stores
            .service
            .set(ServiceRecord {
                id: "edge-orchestration-a".into(),
                services: vec!["ls".into()],
            })
            .unwrap();
        drop(stores);

        let reopened = RegistryStores::open_dir(dir.path());
        assert_eq!(reopened.identity.get(ID_KEY).unwrap().value, "edge-orchestration-a");
        assert_eq!(
            reopened.service.get("edge-orchestration-a").unwrap().services,
            vec!["ls"]
        );
        assert!(reopened.network.list().unwrap().is_empty());
    }
}
