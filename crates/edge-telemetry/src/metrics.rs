//! Prometheus metrics for edge orchestration subsystems.
//!
//! All metrics follow the naming convention: `edge_<subsystem>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., events_total)
//! - **Gauge**: Value that can go up or down (e.g., known_devices)

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // DISCOVERY METRICS
    // =========================================================================

    /// Devices currently present in the configuration store (self included)
    pub static ref KNOWN_DEVICES: Gauge = Gauge::new(
        "edge_discovery_known_devices",
        "Number of devices present in the registry"
    ).expect("metric creation failed");

    /// Peer events applied by the reconciliation loop
    pub static ref DISCOVERY_EVENTS: CounterVec = CounterVec::new(
        Opts::new("edge_discovery_events_total", "Peer events applied to the registry"),
        &["kind"]  // kind: flush/goodbye/upsert
    ).expect("metric creation failed");

    /// Multicast registration attempts, successful or not
    pub static ref REGISTRATION_ATTEMPTS: Counter = Counter::new(
        "edge_discovery_registration_attempts_total",
        "Total multicast registration attempts"
    ).expect("metric creation failed");

    /// Local address changes handled
    pub static ref NETWORK_CHANGES: Counter = Counter::new(
        "edge_discovery_network_changes_total",
        "Total local network address changes handled"
    ).expect("metric creation failed");

    /// Service name mutations by operation and outcome
    pub static ref SERVICE_NAME_CHANGES: CounterVec = CounterVec::new(
        Opts::new(
            "edge_discovery_service_name_changes_total",
            "Advertised service name mutations"
        ),
        &["op", "outcome"]  // op: add/remove/reset, outcome: ok/rejected
    ).expect("metric creation failed");

    // =========================================================================
    // ERROR METRICS
    // =========================================================================

    /// Errors by component and type
    pub static ref SUBSYSTEM_ERRORS: CounterVec = CounterVec::new(
        Opts::new("edge_discovery_errors_total", "Errors by component and type"),
        &["component", "error_type"]
    ).expect("metric creation failed");
}

/// Handle to the registered metrics registry
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(KNOWN_DEVICES.clone()),
        Box::new(DISCOVERY_EVENTS.clone()),
        Box::new(REGISTRATION_ATTEMPTS.clone()),
        Box::new(NETWORK_CHANGES.clone()),
        Box::new(SERVICE_NAME_CHANGES.clone()),
        Box::new(SUBSYSTEM_ERRORS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics() {
        // May fail if already registered by another test, which is fine
        let _ = register_metrics();
    }

    #[test]
    fn test_counter_increment() {
        REGISTRATION_ATTEMPTS.inc();
        assert!(REGISTRATION_ATTEMPTS.get() >= 1.0);
    }

    #[test]
    fn test_gauge_set() {
        KNOWN_DEVICES.set(3.0);
        assert_eq!(KNOWN_DEVICES.get(), 3.0);
    }

    #[test]
    fn test_labelled_counter() {
        DISCOVERY_EVENTS.with_label_values(&["upsert"]).inc();
        assert!(DISCOVERY_EVENTS.with_label_values(&["upsert"]).get() >= 1.0);
    }
}
