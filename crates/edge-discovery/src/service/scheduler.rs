//! Active discovery scheduler.
//!
//! Re-announces the local node on a fixed period so that peers with a
//! passive cache do not time it out. Never touches the registry.

use std::sync::Arc;
use std::time::Duration;

use edge_telemetry::metrics::SUBSYSTEM_ERRORS;
use edge_telemetry::{log_event, metric_inc};
use tokio::time::MissedTickBehavior;

use super::core::DiscoveryContext;
use super::shutdown::ShutdownListener;
use super::SUBSYSTEM;

const MIN_INTERVAL: Duration = Duration::from_secs(1);

pub(crate) async fn run_active_discovery(ctx: Arc<DiscoveryContext>, mut shutdown: ShutdownListener) {
    let period = ctx.config.active_discovery_interval.max(MIN_INTERVAL);
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // First tick completes immediately; registration already announced us
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.triggered() => break,
            _ = ticker.tick() => {
                log_event!(debug, SUBSYSTEM, "Active discovery");
                if let Err(e) = ctx.transport.advertise().await {
                    log_event!(warn, SUBSYSTEM, "Advertisement failed", error = %e);
                    metric_inc!(SUBSYSTEM_ERRORS, &["scheduler", "transport"]);
                }
            }
        }
    }
    log_event!(debug, SUBSYSTEM, "Active discovery stopped");
}
