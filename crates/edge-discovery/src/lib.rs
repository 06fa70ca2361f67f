//! # Edge Discovery
//!
//! Peer discovery and device registry for edge orchestration nodes.
//!
//! Each node advertises itself over multicast service discovery
//! (`_orchestration._tcp` in `local.`, port 42425) and keeps an
//! eventually-consistent registry of its peers: platform, execution type,
//! declared services and addresses.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture with:
//! - **Domain Layer:** records, device identity, advertised TXT metadata
//!   and its 400-byte budget
//! - **Ports Layer:** `DiscoveryApi` (driving) and the store, transport and
//!   network traits (driven)
//! - **Service Layer:** `DiscoveryService`, wiring the domain to the ports
//!   and running the background tasks
//! - **Adapters Layer:** in-memory and JSON file stores, TOML configuration
//!
//! The multicast protocol itself is a driven port; hosts plug in their own
//! responder.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::path::Path;
//! use std::sync::Arc;
//! use edge_discovery::{DiscoveryApi, DiscoveryConfig, DiscoveryService, RegistryStores};
//!
//! let service = DiscoveryService::new(
//!     RegistryStores::in_memory(),
//!     Arc::new(my_responder),
//!     Arc::new(my_network),
//!     DiscoveryConfig::default(),
//! );
//!
//! let identity = service
//!     .start_discovery(Path::new("/var/edge/data/uuid"), "ubuntu", "native")
//!     .await?;
//! service.add_new_service_name("ls")?;
//!
//! let peers = service.device_list()?;
//! service.stop_discovery().await;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Test utilities (MockTransport, MockNetwork, MockInfoClient)
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Domain
pub use domain::{
    AdvertisedMetadata, ClientError, ConfigurationRecord, DeviceIdentity, DiscoveryConfig,
    DiscoveryError, DiscoveryEvent, DiscoveryResult, IdentityRecord, NetworkError, NetworkRecord,
    OrchestrationInfo, PeerEntity, Record, RetryPolicy, ServiceRecord, StoreError, SystemEntry,
    TransportError, MAX_TXT_SIZE,
};

// Port traits
pub use ports::{
    ConfigProvider, DiscoveryApi, DiscoveryTransport, NetInterface, NetworkLayer,
    OrchestrationInfoClient, RecordStore, Registration, RegistryStores,
};

// Service
pub use service::{retry_with_backoff, DiscoveryService, ShutdownListener, ShutdownSignal};

// Adapters
pub use adapters::{ConfigError, InMemoryRecordStore, JsonFileRecordStore, TomlConfigProvider};
