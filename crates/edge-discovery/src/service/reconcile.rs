//! Peer reconciliation loop.
//!
//! Single consumer of the transport's peer event feed. Events are applied
//! to the registry strictly in arrival order; a failing event is logged
//! and the loop moves on.

use std::sync::Arc;

use edge_telemetry::metrics::{DISCOVERY_EVENTS, SUBSYSTEM_ERRORS};
use edge_telemetry::{log_event, log_peer_event, metric_inc};
use tokio::sync::mpsc;

use super::core::DiscoveryContext;
use super::shutdown::ShutdownListener;
use super::SUBSYSTEM;
use crate::domain::{DiscoveryEvent, DiscoveryResult, NetworkRecord, PeerEntity, StoreError};

/// Consume peer events until shutdown or until the feed closes.
pub(crate) async fn run_reconciliation(
    ctx: Arc<DiscoveryContext>,
    mut events: mpsc::Receiver<DiscoveryEvent>,
    mut shutdown: ShutdownListener,
) {
    log_event!(debug, SUBSYSTEM, "Peer reconciliation started");
    loop {
        tokio::select! {
            _ = shutdown.triggered() => break,
            event = events.recv() => match event {
                Some(event) => apply_on_blocking_pool(&ctx, event).await,
                None => {
                    log_event!(debug, SUBSYSTEM, "Peer event feed closed");
                    break;
                }
            },
        }
    }
    log_event!(debug, SUBSYSTEM, "Peer reconciliation stopped");
}

/// Store writes may hit the disk, so events are applied on the blocking
/// pool. Awaiting each one keeps arrival order.
async fn apply_on_blocking_pool(ctx: &Arc<DiscoveryContext>, event: DiscoveryEvent) {
    let worker = Arc::clone(ctx);
    if let Err(e) = tokio::task::spawn_blocking(move || worker.apply_event(event)).await {
        log_event!(error, SUBSYSTEM, "Peer event worker failed", error = %e);
        metric_inc!(SUBSYSTEM_ERRORS, &["reconcile", "worker"]);
    }
}

impl DiscoveryContext {
    /// Apply one peer event to the registry.
    pub(crate) fn apply_event(&self, event: DiscoveryEvent) {
        let (kind, result) = match event {
            DiscoveryEvent::Flush => ("flush", self.flush_peers()),
            DiscoveryEvent::Peer(peer) if peer.is_goodbye() => {
                ("goodbye", self.remove_peer(&peer.device_id))
            }
            DiscoveryEvent::Peer(peer) => ("upsert", self.upsert_peer(&peer)),
        };

        metric_inc!(DISCOVERY_EVENTS, &[kind]);
        if let Err(e) = result {
            log_event!(warn, SUBSYSTEM, "Failed to apply peer event", kind, error = %e);
            metric_inc!(SUBSYSTEM_ERRORS, &["reconcile", e.error_type()]);
        }
        self.update_known_devices();
    }

    /// Forget every device except the local one.
    fn flush_peers(&self) -> DiscoveryResult<()> {
        let local_id = self.local_id()?;
        let mut first_error = None;
        for id in self.known_ids()? {
            if id == local_id {
                continue;
            }
            if let Err(e) = self.delete_device_records(&id) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn remove_peer(&self, device_id: &str) -> DiscoveryResult<()> {
        if self.local_id().ok().as_deref() == Some(device_id) {
            log_peer_event!(debug, SUBSYSTEM, "Ignoring goodbye for the local device", device_id);
            return Ok(());
        }
        log_peer_event!(info, SUBSYSTEM, "Peer left", device_id);
        self.delete_device_records(device_id)
    }

    fn upsert_peer(&self, peer: &PeerEntity) -> DiscoveryResult<()> {
        log_peer_event!(debug, SUBSYSTEM, "Peer update", peer.device_id, ttl = peer.ttl);
        let (conf, net, svc) = peer.to_records();
        self.stores.configuration.set(conf)?;
        self.stores.service.set(svc)?;

        // The network monitor owns the local network record
        if self.local_id().ok().as_deref() == Some(peer.device_id.as_str()) {
            return Ok(());
        }

        match self.stores.network.get(&net.id) {
            Ok(stored) if stored.ipv4 == net.ipv4 => Ok(()),
            Ok(stored) => {
                self.stores.network.set(NetworkRecord {
                    rtt: stored.rtt,
                    ..net
                })?;
                Ok(())
            }
            Err(StoreError::NotFound(_)) => {
                self.stores.network.set(net)?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
