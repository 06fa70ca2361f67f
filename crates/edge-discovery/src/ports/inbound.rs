//! # Driving Port (Inbound API)
//!
//! What the orchestration bootstrap and REST handlers call.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use crate::domain::{AdvertisedMetadata, DeviceIdentity, DiscoveryResult, OrchestrationInfo};

/// Discovery and registry operations.
///
/// Service name operations and queries never block on the network and are
/// plain functions; starting, stopping and relayed registration await.
#[async_trait]
pub trait DiscoveryApi: Send + Sync {
    /// Bootstrap identity, register with the multicast transport and start
    /// the background tasks.
    ///
    /// Blocks until local addresses are available and registration
    /// succeeds, retrying per the configured policy.
    async fn start_discovery(
        &self,
        uuid_path: &Path,
        platform: &str,
        exec_type: &str,
    ) -> DiscoveryResult<DeviceIdentity>;

    /// Signal the background tasks and shut the transport down.
    ///
    /// A no-op (with a warning) if no server was started or it is already
    /// stopped. A start still in progress returns `Cancelled`.
    async fn stop_discovery(&self);

    /// Append a service name to the advertised metadata.
    fn add_new_service_name(&self, name: &str) -> DiscoveryResult<()>;

    /// Remove a service name from the advertised metadata.
    fn remove_service_name(&self, name: &str) -> DiscoveryResult<()>;

    /// Advertise only platform and execution type.
    fn reset_service_name(&self);

    /// Local device ID.
    fn device_id(&self) -> DiscoveryResult<String>;

    /// Local platform, execution type and services.
    fn orchestration_info(&self) -> DiscoveryResult<AdvertisedMetadata>;

    /// Every device with a complete set of records.
    fn device_list(&self) -> DiscoveryResult<HashMap<String, OrchestrationInfo>>;

    /// One device with a complete set of records.
    fn device_with_id(&self, device_id: &str) -> DiscoveryResult<OrchestrationInfo>;

    /// Addresses of every device declaring `service`.
    fn device_ips_with_service(&self, service: &str) -> DiscoveryResult<Vec<String>>;

    /// Forget the device owning `ip`. The local device cannot be deleted.
    fn delete_device_with_ip(&self, ip: &str) -> DiscoveryResult<()>;

    /// Forget a device. The local device cannot be deleted.
    fn delete_device_with_id(&self, device_id: &str) -> DiscoveryResult<()>;

    /// Register a device reported by a relay.
    ///
    /// Nothing is requested if `private_addr` is already stored for the
    /// device. Otherwise its orchestration info is fetched from
    /// `virtual_addr` (bounded retries) and recorded under that address.
    async fn add_device_info(
        &self,
        device_id: &str,
        virtual_addr: &str,
        private_addr: &str,
    ) -> DiscoveryResult<()>;
}
