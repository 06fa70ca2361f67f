//! # Edge Telemetry
//!
//! Observability bootstrap for edge orchestration subsystems.
//!
//! ## Components
//!
//! - **Logs**: `tracing` subscriber with env filter, pretty or JSON output
//! - **Metrics**: Prometheus collectors in a process-wide registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use edge_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::for_subsystem("discovery");
//! let _guard = init_telemetry(config).expect("Failed to init telemetry");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `EDGE_SERVICE_NAME` | `edge-orchestration` | Service name in logs |
//! | `EDGE_LOG_LEVEL` | `info` | Log level filter |
//! | `EDGE_JSON_LOGS` | `false` | JSON output |

mod config;
mod logging;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, DISCOVERY_EVENTS, KNOWN_DEVICES,
    NETWORK_CHANGES, REGISTRATION_ATTEMPTS, SERVICE_NAME_CHANGES, SUBSYSTEM_ERRORS,
};
pub use tracing_setup::TracingGuard;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    let tracing_guard = tracing_setup::init_tracing(&config)?;

    Ok(TelemetryGuard {
        _tracing: tracing_guard,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Convenience macro for creating a span with subsystem context.
///
/// ```rust,ignore
/// let span = edge_telemetry::subsystem_span!("reconcile", subsystem = "discovery");
/// ```
#[macro_export]
macro_rules! subsystem_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "edge-orchestration");
    }

    #[test]
    fn test_metric_inc_macro() {
        metric_inc!(NETWORK_CHANGES);
        metric_inc!(SERVICE_NAME_CHANGES, &["add", "ok"]);
        assert!(NETWORK_CHANGES.get() >= 1.0);
    }
}
