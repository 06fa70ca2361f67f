//! Devices reported by a relay instead of multicast.

use std::sync::Arc;

use edge_telemetry::metrics::SUBSYSTEM_ERRORS;
use edge_telemetry::{log_event, log_peer_event, metric_inc};

use super::core::{DiscoveryContext, DiscoveryService};
use super::retry::retry_with_backoff;
use super::SUBSYSTEM;
use crate::domain::{DiscoveryError, DiscoveryResult, OrchestrationInfo, PeerEntity, StoreError};

/// TTL recorded for relayed devices.
const RELAYED_TTL: u32 = 1;

impl DiscoveryContext {
    /// Whether `addr` is already among the stored addresses of `device_id`.
    fn has_address(&self, device_id: &str, addr: &str) -> bool {
        match self.stores.network.get(device_id) {
            Ok(net) => net.ipv4.iter().any(|ip| ip == addr),
            Err(StoreError::NotFound(_)) => false,
            Err(e) => {
                log_peer_event!(warn, SUBSYSTEM, "Failed to read network record", device_id, error = %e);
                false
            }
        }
    }
}

impl DiscoveryService {
    pub(crate) async fn add_relayed_device(
        &self,
        device_id: &str,
        virtual_addr: &str,
        private_addr: &str,
    ) -> DiscoveryResult<()> {
        let ctx = &self.ctx;
        if ctx.has_address(device_id, private_addr) {
            log_peer_event!(debug, SUBSYSTEM, "Relayed device already known", device_id, private_addr);
            return Ok(());
        }

        let client = self.info_client.as_ref().ok_or_else(|| {
            DiscoveryError::SystemError("no orchestration info client configured".to_string())
        })?;

        let mut shutdown = ctx.shutdown.listener();
        let meta = retry_with_backoff(
            ctx.config.device_info_retry(),
            &mut shutdown,
            "orchestration info request",
            |_| {
                let client = Arc::clone(client);
                let address = virtual_addr.to_string();
                async move { client.orchestration_info(&address).await }
            },
        )
        .await
        .inspect_err(|e| {
            log_peer_event!(warn, SUBSYSTEM, "Giving up on relayed device", device_id, error = %e);
            metric_inc!(SUBSYSTEM_ERRORS, &["device_info", e.error_type()]);
        })?;

        let ipv4 = if virtual_addr.is_empty() {
            Vec::new()
        } else {
            vec![virtual_addr.to_string()]
        };
        let (conf, net, svc) = PeerEntity {
            device_id: device_id.to_string(),
            ttl: RELAYED_TTL,
            info: OrchestrationInfo {
                platform: meta.platform,
                execution_type: meta.exec_type,
                service_list: meta.services,
                ipv4,
            },
        }
        .to_records();

        if !net.ipv4.is_empty() {
            ctx.stores.network.set(net)?;
        }
        ctx.stores.configuration.set(conf)?;
        ctx.stores.service.set(svc)?;
        ctx.update_known_devices();

        log_event!(info, SUBSYSTEM, "Recorded relayed device", device_id, address = virtual_addr);
        Ok(())
    }
}
