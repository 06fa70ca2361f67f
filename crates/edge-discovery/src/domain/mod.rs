//! # Domain Layer
//!
//! Pure types and rules of the discovery registry: records, device identity,
//! advertised metadata with its byte budget, configuration and errors.
//! Nothing here touches the network or the async runtime.

pub mod config;
pub mod entities;
pub mod errors;
pub mod identity;
pub mod metadata;

pub use config::{
    DiscoveryConfig, RetryPolicy, ACTIVE_DISCOVERY_INTERVAL, DEVICE_INFO_ATTEMPTS, DOMAIN,
    SERVICE_PORT, SERVICE_TYPE,
};
pub use entities::{
    ConfigurationRecord, DiscoveryEvent, IdentityRecord, NetworkRecord, OrchestrationInfo,
    PeerEntity, Record, ServiceRecord, SystemEntry, EXEC_TYPE_KEY, ID_KEY, PLATFORM_KEY,
};
pub use errors::{
    ClientError, DiscoveryError, DiscoveryResult, NetworkError, StoreError, TransportError,
};
pub use identity::{load_or_create_uuid, DeviceIdentity};
pub use metadata::{AdvertisedMetadata, MAX_TXT_SIZE};
