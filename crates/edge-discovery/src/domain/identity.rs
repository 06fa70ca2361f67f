//! Node identity bootstrap.

use std::fs;
use std::path::Path;

use uuid::Uuid;

/// Prefix of every device ID.
pub const DEVICE_ID_PREFIX: &str = "edge-orchestration-";
/// Prefix of the advertised host name.
pub const HOSTNAME_PREFIX: &str = "edge-";

/// Identity derived from the persisted node UUID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub uuid: String,
    pub device_id: String,
    pub hostname: String,
}

impl DeviceIdentity {
    pub fn from_uuid(uuid: impl Into<String>) -> Self {
        let uuid = uuid.into();
        Self {
            device_id: format!("{DEVICE_ID_PREFIX}{uuid}"),
            hostname: format!("{HOSTNAME_PREFIX}{uuid}"),
            uuid,
        }
    }

    /// Load the UUID at `path`, minting and saving a new one if needed.
    pub fn bootstrap(path: &Path) -> Self {
        Self::from_uuid(load_or_create_uuid(path))
    }
}

/// Read the node UUID from `path`.
///
/// On a read failure (or an empty file) a fresh v4 UUID is generated and
/// written back. A failed write is logged and the fresh UUID is still
/// returned, so the node runs with an in-memory identity until the next
/// successful save.
pub fn load_or_create_uuid(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(saved) if !saved.trim().is_empty() => {
            let uuid = saved.trim().to_string();
            tracing::info!(path = %path.display(), %uuid, "Loaded saved node UUID");
            uuid
        }
        result => {
            if let Err(e) = result {
                tracing::info!(path = %path.display(), error = %e, "No saved node UUID");
            }
            let uuid = Uuid::new_v4().to_string();
            if let Err(e) = save_uuid(path, &uuid) {
                tracing::warn!(path = %path.display(), error = %e, "Failed to persist node UUID");
            }
            tracing::info!(%uuid, "Generated node UUID");
            uuid
        }
    }
}

fn save_uuid(path: &Path, uuid: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, uuid)
}
