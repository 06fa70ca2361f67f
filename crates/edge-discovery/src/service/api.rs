use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use super::core::DiscoveryService;
use crate::domain::{AdvertisedMetadata, DeviceIdentity, DiscoveryResult, OrchestrationInfo};
use crate::ports::DiscoveryApi;

#[async_trait]
impl DiscoveryApi for DiscoveryService {
    async fn start_discovery(
        &self,
        uuid_path: &Path,
        platform: &str,
        exec_type: &str,
    ) -> DiscoveryResult<DeviceIdentity> {
        self.start(uuid_path, platform, exec_type).await
    }

    async fn stop_discovery(&self) {
        self.stop().await
    }

    fn add_new_service_name(&self, name: &str) -> DiscoveryResult<()> {
        self.ctx.add_service_name(name)
    }

    fn remove_service_name(&self, name: &str) -> DiscoveryResult<()> {
        self.ctx.remove_service_name(name)
    }

    fn reset_service_name(&self) {
        self.ctx.reset_service_names()
    }

    fn device_id(&self) -> DiscoveryResult<String> {
        self.ctx.local_id()
    }

    fn orchestration_info(&self) -> DiscoveryResult<AdvertisedMetadata> {
        self.ctx.orchestration_info()
    }

    fn device_list(&self) -> DiscoveryResult<HashMap<String, OrchestrationInfo>> {
        self.ctx.device_list()
    }

    fn device_with_id(&self, device_id: &str) -> DiscoveryResult<OrchestrationInfo> {
        self.ctx.device_with_id(device_id)
    }

    fn device_ips_with_service(&self, service: &str) -> DiscoveryResult<Vec<String>> {
        self.ctx.device_ips_with_service(service)
    }

    fn delete_device_with_ip(&self, ip: &str) -> DiscoveryResult<()> {
        self.ctx.delete_device_with_ip(ip)
    }

    fn delete_device_with_id(&self, device_id: &str) -> DiscoveryResult<()> {
        self.ctx.delete_device_with_id(device_id)
    }

    async fn add_device_info(
        &self,
        device_id: &str,
        virtual_addr: &str,
        private_addr: &str,
    ) -> DiscoveryResult<()> {
        self.add_relayed_device(device_id, virtual_addr, private_addr)
            .await
    }
}
