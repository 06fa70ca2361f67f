//! Registry records and peer events.
//!
//! Field names on the wire match the records written by existing
//! orchestration nodes (`id`, `platform`, `executionType`, `services`,
//! `IPv4`, `RTT`) so that a store directory can be shared across versions.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Identity store key holding the local device ID.
pub const ID_KEY: &str = "id";
/// Identity store key holding the local platform.
pub const PLATFORM_KEY: &str = "platform";
/// Identity store key holding the local execution type.
pub const EXEC_TYPE_KEY: &str = "execType";

/// A value that can live in a keyed record store.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Key the record is stored under.
    fn key(&self) -> &str;
}

/// One entry of the identity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemEntry {
    pub name: String,
    pub value: String,
}

impl SystemEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Record for SystemEntry {
    fn key(&self) -> &str {
        &self.name
    }
}

/// Local node identity, stored as three [`SystemEntry`] rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    pub id: String,
    pub platform: String,
    pub exec_type: String,
}

impl IdentityRecord {
    /// Rows to write into the identity store.
    pub fn entries(&self) -> [SystemEntry; 3] {
        [
            SystemEntry::new(ID_KEY, &self.id),
            SystemEntry::new(PLATFORM_KEY, &self.platform),
            SystemEntry::new(EXEC_TYPE_KEY, &self.exec_type),
        ]
    }
}

/// Platform, execution type and declared services of one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationRecord {
    pub id: String,
    pub platform: String,
    #[serde(rename = "executionType")]
    pub exec_type: String,
    #[serde(default)]
    pub services: Vec<String>,
}

impl Record for ConfigurationRecord {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Reachability of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRecord {
    pub id: String,
    #[serde(rename = "IPv4", default)]
    pub ipv4: Vec<String>,
    #[serde(rename = "RTT", default)]
    pub rtt: f64,
}

impl Record for NetworkRecord {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Declared service names of one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub id: String,
    #[serde(default)]
    pub services: Vec<String>,
}

impl Record for ServiceRecord {
    fn key(&self) -> &str {
        &self.id
    }
}

/// What a node advertises about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationInfo {
    pub platform: String,
    #[serde(rename = "executionType")]
    pub execution_type: String,
    #[serde(rename = "serviceList", default)]
    pub service_list: Vec<String>,
    #[serde(rename = "IPv4", default)]
    pub ipv4: Vec<String>,
}

/// A peer as seen by the multicast transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerEntity {
    pub device_id: String,
    /// Seconds the announcement stays valid. Zero is a goodbye.
    pub ttl: u32,
    pub info: OrchestrationInfo,
}

impl PeerEntity {
    /// True when the peer announced its departure.
    pub fn is_goodbye(&self) -> bool {
        self.ttl == 0
    }

    /// Split the entity into the three per-device records.
    pub fn to_records(&self) -> (ConfigurationRecord, NetworkRecord, ServiceRecord) {
        let conf = ConfigurationRecord {
            id: self.device_id.clone(),
            platform: self.info.platform.clone(),
            exec_type: self.info.execution_type.clone(),
            services: self.info.service_list.clone(),
        };
        let net = NetworkRecord {
            id: self.device_id.clone(),
            ipv4: self.info.ipv4.clone(),
            rtt: 0.0,
        };
        let svc = ServiceRecord {
            id: self.device_id.clone(),
            services: self.info.service_list.clone(),
        };
        (conf, net, svc)
    }
}

/// Item delivered on the transport's peer event feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    /// The transport lost track of its peers; drop everything but self.
    Flush,
    /// Presence update or goodbye from one peer.
    Peer(PeerEntity),
}
