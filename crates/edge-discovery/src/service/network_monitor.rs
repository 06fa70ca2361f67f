//! Local network change monitor.

use std::net::IpAddr;
use std::sync::Arc;

use edge_telemetry::metrics::{NETWORK_CHANGES, SUBSYSTEM_ERRORS};
use edge_telemetry::{log_event, log_peer_event, metric_inc};
use tokio::sync::mpsc;

use super::core::DiscoveryContext;
use super::shutdown::ShutdownListener;
use super::SUBSYSTEM;
use crate::domain::{DiscoveryResult, NetworkRecord, StoreError};

/// IPv4 addresses of `ips`, as stored in network records.
pub(crate) fn ipv4_strings(ips: &[IpAddr]) -> Vec<String> {
    ips.iter()
        .filter(|ip| ip.is_ipv4())
        .map(ToString::to_string)
        .collect()
}

/// Consume local address changes until shutdown or until the feed closes.
pub(crate) async fn run_network_monitor(
    ctx: Arc<DiscoveryContext>,
    mut changes: mpsc::Receiver<Vec<IpAddr>>,
    mut shutdown: ShutdownListener,
) {
    log_event!(debug, SUBSYSTEM, "Network monitor started");
    loop {
        tokio::select! {
            _ = shutdown.triggered() => break,
            change = changes.recv() => match change {
                Some(ips) => ctx.apply_network_change(ips).await,
                None => {
                    log_event!(debug, SUBSYSTEM, "Network change feed closed");
                    break;
                }
            },
        }
    }
    log_event!(debug, SUBSYSTEM, "Network monitor stopped");
}

impl DiscoveryContext {
    /// Record the new local address list and re-announce on it.
    pub(crate) async fn apply_network_change(&self, ips: Vec<IpAddr>) {
        metric_inc!(NETWORK_CHANGES);

        let local_id = match self.local_id() {
            Ok(id) => id,
            Err(e) => {
                log_event!(debug, SUBSYSTEM, "Ignoring network change before start", error = %e);
                return;
            }
        };

        let ipv4 = ipv4_strings(&ips);
        log_peer_event!(info, SUBSYSTEM, "Local addresses changed", local_id, ips = ?ipv4);
        if let Err(e) = self.write_local_network(&local_id, ipv4) {
            log_event!(warn, SUBSYSTEM, "Failed to store local network record", error = %e);
            metric_inc!(SUBSYSTEM_ERRORS, &["network_monitor", e.error_type()]);
        }

        if let Err(e) = self.transport.reset_server(ips).await {
            log_event!(warn, SUBSYSTEM, "Failed to reset multicast server", error = %e);
            metric_inc!(SUBSYSTEM_ERRORS, &["network_monitor", "transport"]);
        }
    }

    /// Unconditional write of the local network record, keeping its RTT.
    fn write_local_network(&self, local_id: &str, ipv4: Vec<String>) -> DiscoveryResult<()> {
        let rtt = match self.stores.network.get(local_id) {
            Ok(stored) => stored.rtt,
            Err(StoreError::NotFound(_)) => 0.0,
            Err(e) => return Err(e.into()),
        };
        self.stores.network.set(NetworkRecord {
            id: local_id.to_string(),
            ipv4,
            rtt,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_strings_drops_v6() {
        let ips: Vec<IpAddr> = vec![
            "192.0.2.1".parse().unwrap(),
            "fe80::1".parse().unwrap(),
            "10.0.0.3".parse().unwrap(),
        ];
        assert_eq!(ipv4_strings(&ips), vec!["192.0.2.1", "10.0.0.3"]);
    }
}
