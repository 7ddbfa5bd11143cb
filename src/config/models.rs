use crate::humanize::ByteSize;
use crate::store::DEFAULT_CAPACITY;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub file_log: FileLogConfig,
}

/// In-memory store sizes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Retained log messages
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Retained peer events, sized independently of `capacity`
    #[serde(default = "default_capacity")]
    pub peer_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            peer_capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

/// Rotating file backup of accepted messages
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileLogConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    /// Active file is `<base_name>.log`
    #[serde(default = "default_base_name")]
    pub base_name: String,
    #[serde(default)]
    pub rotate_on_startup: bool,
    /// Keep rotated files as timestamped archives instead of discarding them
    #[serde(default = "default_true")]
    pub archive: bool,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: ByteSize,
    /// Entries buffered between producers and the writer thread
    ///
    /// Rounded up to the next power of two (1000 buffers 1024). When the
    /// buffer is full the oldest queued entries are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default)]
    pub retention: RetentionConfig,
}

impl Default for FileLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: default_directory(),
            base_name: default_base_name(),
            rotate_on_startup: false,
            archive: true,
            max_file_size: default_max_file_size(),
            queue_capacity: default_queue_capacity(),
            retention: RetentionConfig::default(),
        }
    }
}

impl FileLogConfig {
    pub fn active_path(&self) -> PathBuf {
        self.directory.join(format!("{}.log", self.base_name))
    }
}

fn default_true() -> bool {
    true
}

fn default_directory() -> PathBuf {
    PathBuf::from("logs")
}

fn default_base_name() -> String {
    "logledger".to_string()
}

fn default_max_file_size() -> ByteSize {
    ByteSize::kib(64)
}

fn default_queue_capacity() -> usize {
    1024
}

/// Calendar unit for archive age limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeUnit {
    Days,
    #[default]
    Months,
    Years,
}

impl fmt::Display for AgeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AgeUnit::Days => "days",
            AgeUnit::Months => "months",
            AgeUnit::Years => "years",
        })
    }
}

/// Archive pruning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetentionConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_max_age")]
    pub max_age: u32,
    #[serde(default)]
    pub max_age_unit: AgeUnit,
    /// Newest archives to keep regardless of age
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_archives: Option<usize>,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_age: default_max_age(),
            max_age_unit: AgeUnit::default(),
            max_archives: None,
        }
    }
}

fn default_max_age() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.store.capacity, 20_000);
        assert_eq!(config.store.peer_capacity, 20_000);
        assert!(config.file_log.enabled);
        assert_eq!(config.file_log.max_file_size.as_u64(), 64 * 1024);
        assert_eq!(config.file_log.retention.max_age_unit, AgeUnit::Months);
        assert_eq!(
            config.file_log.active_path(),
            PathBuf::from("logs/logledger.log")
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[store]
peer_capacity = 500

[file_log.retention]
enabled = true
max_age_unit = "days"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.capacity, 20_000);
        assert_eq!(config.store.peer_capacity, 500);
        assert!(config.file_log.retention.enabled);
        assert_eq!(config.file_log.retention.max_age, 1);
        assert_eq!(config.file_log.retention.max_age_unit, AgeUnit::Days);
    }
}
