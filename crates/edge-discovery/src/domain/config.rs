//! Discovery configuration values.

use std::time::Duration;

use super::metadata::MAX_TXT_SIZE;

/// Multicast service type advertised by every orchestration node.
pub const SERVICE_TYPE: &str = "_orchestration._tcp";
/// Multicast domain.
pub const DOMAIN: &str = "local.";
/// Port announced in the service record.
pub const SERVICE_PORT: u16 = 42425;
/// Interval between active re-advertisements.
pub const ACTIVE_DISCOVERY_INTERVAL: Duration = Duration::from_secs(3600);
/// Requests made for a relayed device's orchestration info before giving up.
pub const DEVICE_INFO_ATTEMPTS: u32 = 5;

/// Fixed-interval retry policy.
///
/// `max_attempts = None` retries until the operation succeeds or the
/// termination signal fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    pub fn bounded(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: Some(max_attempts),
        }
    }
}

/// Configuration of the discovery subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Multicast service type (default: `_orchestration._tcp`)
    pub service_type: String,
    /// Multicast domain (default: `local.`)
    pub domain: String,
    /// Announced port (default: 42425)
    pub port: u16,
    /// TXT byte budget (default: 400)
    pub max_txt_size: usize,
    /// Re-advertisement period (default: 1 hour)
    pub active_discovery_interval: Duration,
    /// Delay between attempts while waiting for IPs or registration (default: 1s)
    pub retry_interval: Duration,
    /// Upper bound on IP polling attempts (default: unbounded)
    pub max_ip_attempts: Option<u32>,
    /// Upper bound on registration attempts (default: unbounded)
    pub max_registration_attempts: Option<u32>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            service_type: SERVICE_TYPE.to_string(),
            domain: DOMAIN.to_string(),
            port: SERVICE_PORT,
            max_txt_size: MAX_TXT_SIZE,
            active_discovery_interval: ACTIVE_DISCOVERY_INTERVAL,
            retry_interval: Duration::from_secs(1),
            max_ip_attempts: None,
            max_registration_attempts: None,
        }
    }
}

impl DiscoveryConfig {
    /// Create a config suitable for testing (millisecond retries)
    pub fn for_testing() -> Self {
        Self {
            retry_interval: Duration::from_millis(10),
            ..Self::default()
        }
    }

    pub fn ip_retry(&self) -> RetryPolicy {
        RetryPolicy {
            interval: self.retry_interval,
            max_attempts: self.max_ip_attempts,
        }
    }

    pub fn registration_retry(&self) -> RetryPolicy {
        RetryPolicy {
            interval: self.retry_interval,
            max_attempts: self.max_registration_attempts,
        }
    }

    /// Always bounded, a relayed device that never answers is dropped.
    pub fn device_info_retry(&self) -> RetryPolicy {
        RetryPolicy::bounded(self.retry_interval, DEVICE_INFO_ATTEMPTS)
    }
}
