//! Configuration management for logledger
//!
//! Settings are layered, lowest priority first:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables
//!
//! # Usage
//!
//! ```no_run
//! use logledger::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Retaining {} messages", config.store.capacity);
//! ```
//!
//! # Environment Variables
//!
//! Any key can be overridden with `LOGLEDGER__<section>__<key>`:
//! - `LOGLEDGER__STORE__CAPACITY=50000`
//! - `LOGLEDGER__FILE_LOG__MAX_FILE_SIZE=10MB`
//!
//! The file is read from `config/logledger.toml` unless `LOGLEDGER_CONFIG`
//! points elsewhere.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{AgeUnit, Config, FileLogConfig, RetentionConfig, StoreConfig};
pub use sources::config_path;
pub use validation::{MAX_FILE_SIZE, MIN_FILE_SIZE, ValidationError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment) and validate it
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate(self)
    }

    /// Configuration without a file writer, for purely in-memory use
    pub fn in_memory() -> Self {
        let mut config = Self::default();
        config.file_log.enabled = false;
        config
    }
}
