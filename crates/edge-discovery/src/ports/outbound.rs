//! # Driven Ports (Outbound SPI)
//!
//! Interfaces the discovery service requires from the host: keyed record
//! stores, the multicast discovery transport, the local network layer and
//! the client used to query relayed peers.
//!
//! # Thread Safety
//!
//! Every port is `Send + Sync`; one instance is shared by the caller and
//! all background tasks.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{
    AdvertisedMetadata, ClientError, ConfigurationRecord, DiscoveryConfig, DiscoveryEvent,
    NetworkError, NetworkRecord, PeerEntity, Record, ServiceRecord, StoreError, SystemEntry,
    TransportError,
};

/// Keyed store of one record type.
///
/// A single call is atomic. Nothing spans calls: writing two records for
/// the same device is two independent operations.
pub trait RecordStore<R: Record>: Send + Sync {
    /// Fetch the record under `key`, `StoreError::NotFound` on a miss.
    fn get(&self, key: &str) -> Result<R, StoreError>;

    /// Insert or overwrite the record under its own key.
    fn set(&self, record: R) -> Result<(), StoreError>;

    /// Remove the record under `key`. Removing an absent key succeeds.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Every stored record, in no particular order.
    fn list(&self) -> Result<Vec<R>, StoreError>;
}

/// The four stores backing the registry.
///
/// `identity` is keyed by the fixed names `id`, `platform` and `execType`;
/// the other three are keyed by device ID.
#[derive(Clone)]
pub struct RegistryStores {
    pub identity: Arc<dyn RecordStore<SystemEntry>>,
    pub configuration: Arc<dyn RecordStore<ConfigurationRecord>>,
    pub network: Arc<dyn RecordStore<NetworkRecord>>,
    pub service: Arc<dyn RecordStore<ServiceRecord>>,
}

/// A network interface the multicast responder may bind to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetInterface {
    pub name: String,
    pub index: u32,
}

/// Everything the transport needs to announce the local node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Instance name, the local device ID
    pub instance: String,
    pub service_type: String,
    pub domain: String,
    pub port: u16,
    pub hostname: String,
    pub addrs: Vec<IpAddr>,
    /// Wire form of the advertised metadata
    pub text: Vec<String>,
    pub interfaces: Vec<NetInterface>,
}

/// Multicast service discovery, treated as a black box.
#[async_trait]
pub trait DiscoveryTransport: Send + Sync {
    /// Start announcing the local node.
    ///
    /// Returns the entity peers will see for this node.
    async fn register(&self, registration: Registration) -> Result<PeerEntity, TransportError>;

    /// Open the peer event feed. Only the latest receiver is fed.
    fn subscribe(&self) -> Result<mpsc::Receiver<DiscoveryEvent>, TransportError>;

    /// Currently advertised TXT strings.
    fn text(&self) -> Vec<String>;

    /// Replace the advertised TXT strings.
    fn set_text(&self, text: Vec<String>) -> Result<(), TransportError>;

    /// Re-announce on a new set of local addresses.
    async fn reset_server(&self, addrs: Vec<IpAddr>) -> Result<(), TransportError>;

    /// Send an unsolicited announcement.
    async fn advertise(&self) -> Result<(), TransportError>;

    /// Send goodbyes and stop the responder.
    async fn shutdown(&self);
}

/// Local network state.
#[async_trait]
pub trait NetworkLayer: Send + Sync {
    /// Begin watching interfaces.
    async fn start(&self) -> Result<(), NetworkError>;

    /// Usable local addresses. `NetworkError::NoAddress` if there are none yet.
    fn ips(&self) -> Result<Vec<IpAddr>, NetworkError>;

    /// Interfaces to bind the multicast responder to.
    fn interfaces(&self) -> Result<Vec<NetInterface>, NetworkError>;

    /// Feed of the full local address list, sent on every change.
    fn subscribe(&self) -> mpsc::Receiver<Vec<IpAddr>>;
}

/// Point-to-point query of a peer's orchestration info, used for devices
/// reported by a relay instead of multicast.
#[async_trait]
pub trait OrchestrationInfoClient: Send + Sync {
    /// Ask the peer at `address` for its platform, execution type and services.
    async fn orchestration_info(&self, address: &str) -> Result<AdvertisedMetadata, ClientError>;
}

/// Source of discovery configuration.
pub trait ConfigProvider: Send + Sync {
    /// Discovery parameters.
    fn discovery_config(&self) -> DiscoveryConfig;

    /// Directory for file-backed stores, `None` for in-memory stores.
    fn store_dir(&self) -> Option<PathBuf>;
}
