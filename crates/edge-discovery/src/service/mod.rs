//! # Discovery Service
//!
//! `DiscoveryService` implements the `DiscoveryApi` port. It owns the
//! collaborators through a shared `DiscoveryContext` and, once started,
//! three background tasks:
//!
//! - peer reconciliation, applying transport events to the registry
//! - network monitor, tracking local address changes
//! - active discovery, re-announcing the node every hour
//!
//! All three stop on the shared `ShutdownSignal`.

// Semantic submodules
mod api;
mod core;
mod device_info;
mod lifecycle;
mod network_monitor;
mod reconcile;
mod registry;
mod retry;
mod scheduler;
mod service_names;
mod shutdown;

// Re-export public API
pub use self::core::DiscoveryService;
pub use retry::retry_with_backoff;
pub use shutdown::{ShutdownListener, ShutdownSignal};

/// Value of the `subsystem` field on every log line of this crate.
pub(crate) const SUBSYSTEM: &str = "discovery";
