use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{DiscoveryConfig, MAX_TXT_SIZE};
use crate::ports::ConfigProvider;

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    discovery: DiscoverySection,
    #[serde(default)]
    retry: RetrySection,
    #[serde(default)]
    store: StoreSection,
}

#[derive(Debug, Deserialize, Default)]
struct DiscoverySection {
    service_type: Option<String>,
    domain: Option<String>,
    port: Option<u16>,
    max_txt_size: Option<usize>,
    active_discovery_interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct RetrySection {
    interval_ms: Option<u64>,
    max_ip_attempts: Option<u32>,
    max_registration_attempts: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct StoreSection {
    dir: Option<PathBuf>,
}

/// TOML-based configuration provider.
///
/// Every key is optional; missing keys take the defaults of
/// [`DiscoveryConfig`].
///
/// # Config File Format
///
/// ```toml
/// [discovery]
/// service_type = "_orchestration._tcp"
/// domain = "local."
/// port = 42425
/// max_txt_size = 400
/// active_discovery_interval_secs = 3600
///
/// [retry]
/// interval_ms = 1000
/// max_ip_attempts = 30
/// max_registration_attempts = 30
///
/// [store]
/// dir = "/var/edge-orchestration/data/db"
/// ```
#[derive(Debug, Clone)]
pub struct TomlConfigProvider {
    config: DiscoveryConfig,
    store_dir: Option<PathBuf>,
}

impl TomlConfigProvider {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let defaults = DiscoveryConfig::default();
        let d = file.discovery;
        let r = file.retry;
        let config = DiscoveryConfig {
            service_type: d.service_type.unwrap_or(defaults.service_type),
            domain: d.domain.unwrap_or(defaults.domain),
            port: d.port.unwrap_or(defaults.port),
            max_txt_size: d.max_txt_size.map_or(defaults.max_txt_size, cap_txt_size),
            active_discovery_interval: d
                .active_discovery_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.active_discovery_interval),
            retry_interval: r
                .interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_interval),
            max_ip_attempts: r.max_ip_attempts,
            max_registration_attempts: r.max_registration_attempts,
        };

        Ok(Self {
            config,
            store_dir: file.store.dir,
        })
    }
}

/// The TXT budget can be lowered but never raised past the wire limit.
fn cap_txt_size(requested: usize) -> usize {
    if requested > MAX_TXT_SIZE {
        tracing::warn!(requested, max = MAX_TXT_SIZE, "max_txt_size above the wire limit, capping");
        return MAX_TXT_SIZE;
    }
    requested
}

impl ConfigProvider for TomlConfigProvider {
    fn discovery_config(&self) -> DiscoveryConfig {
        self.config.clone()
    }

    fn store_dir(&self) -> Option<PathBuf> {
        self.store_dir.clone()
    }
}

/// Errors that can occur during config loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {error}")]
    Io {
        /// Path of the file that failed to load.
        path: String,
        /// Error message from the I/O operation.
        error: String,
    },
    /// TOML parse error.
    #[error("failed to parse config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_all_defaults() {
        let provider = TomlConfigProvider::parse("").unwrap();
        assert_eq!(provider.discovery_config(), DiscoveryConfig::default());
        assert_eq!(provider.store_dir(), None);
    }

    #[test]
    fn test_full_file() {
        let provider = TomlConfigProvider::parse(
            r#"
            [discovery]
            port = 5353
            active_discovery_interval_secs = 60

            [retry]
            interval_ms = 250
            max_registration_attempts = 4

            [store]
            dir = "/tmp/edge-db"
            "#,
        )
        .unwrap();

        let config = provider.discovery_config();
        assert_eq!(config.port, 5353);
        assert_eq!(config.service_type, "_orchestration._tcp");
        assert_eq!(config.active_discovery_interval, Duration::from_secs(60));
        assert_eq!(config.retry_interval, Duration::from_millis(250));
        assert_eq!(config.max_ip_attempts, None);
        assert_eq!(config.max_registration_attempts, Some(4));
        assert_eq!(provider.store_dir(), Some(PathBuf::from("/tmp/edge-db")));
    }

    #[test]
    fn test_txt_budget_capped_at_wire_limit() {
        let raised = TomlConfigProvider::parse("[discovery]\nmax_txt_size = 4096").unwrap();
        assert_eq!(raised.discovery_config().max_txt_size, MAX_TXT_SIZE);

        let lowered = TomlConfigProvider::parse("[discovery]\nmax_txt_size = 200").unwrap();
        assert_eq!(lowered.discovery_config().max_txt_size, 200);
    }

    #[test]
    fn test_parse_error() {
        let err = TomlConfigProvider::parse("[discovery]\nport = \"high\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TomlConfigProvider::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
