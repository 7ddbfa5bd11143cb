use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "LOGLEDGER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/logledger.toml";
const ENV_PREFIX: &str = "LOGLEDGER";
const ENV_SEPARATOR: &str = "__";

/// Path of the TOML file: `LOGLEDGER_CONFIG` or the default location
pub fn config_path() -> PathBuf {
    env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration with priority (lowest to highest):
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if it exists)
/// 3. `.env` file (via dotenvy)
/// 4. Process environment
pub fn load() -> Result<Config, ConfigError> {
    let _ = dotenvy::dotenv();
    load_from_sources(config_path())
}

/// Load from a specific file plus environment overrides
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // LOGLEDGER__FILE_LOG__MAX_FILE_SIZE -> file_log.max_file_size
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}
