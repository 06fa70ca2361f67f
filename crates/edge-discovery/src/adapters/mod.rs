//! # Adapters
//!
//! Concrete implementations of the driven ports that ship with the crate:
//! keyed record stores (in-memory and JSON file) and TOML configuration.

pub mod config;
pub mod store;

pub use config::{ConfigError, TomlConfigProvider};
pub use store::{InMemoryRecordStore, JsonFileRecordStore};
