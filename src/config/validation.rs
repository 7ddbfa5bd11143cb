use super::models::Config;
use thiserror::Error;

/// Accepted range for `file_log.max_file_size`, in bytes
pub const MIN_FILE_SIZE: u64 = 1024;
pub const MAX_FILE_SIZE: u64 = 1_000_000_000;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Store capacity must be positive: {field} = 0")]
    ZeroCapacity { field: &'static str },

    #[error("max_file_size ({actual}) must be between 1024 and 1000000000 bytes")]
    FileSizeOutOfRange { actual: u64 },

    #[error("queue_capacity must be positive")]
    ZeroQueueCapacity,

    #[error("base_name must be a non-empty file name without separators: {0:?}")]
    InvalidBaseName(String),

    #[error("Retention max_age must be positive when retention is enabled")]
    ZeroRetentionAge,

    #[error("Retention max_archives must be positive when set")]
    ZeroRetentionCount,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_store(config)?;
    validate_file_log(config)?;
    validate_retention(config)?;
    Ok(())
}

fn validate_store(config: &Config) -> Result<(), ValidationError> {
    if config.store.capacity == 0 {
        return Err(ValidationError::ZeroCapacity { field: "capacity" });
    }
    if config.store.peer_capacity == 0 {
        return Err(ValidationError::ZeroCapacity {
            field: "peer_capacity",
        });
    }
    Ok(())
}

fn validate_file_log(config: &Config) -> Result<(), ValidationError> {
    let file_log = &config.file_log;

    let size = file_log.max_file_size.as_u64();
    if !(MIN_FILE_SIZE..=MAX_FILE_SIZE).contains(&size) {
        return Err(ValidationError::FileSizeOutOfRange { actual: size });
    }

    if file_log.queue_capacity == 0 {
        return Err(ValidationError::ZeroQueueCapacity);
    }

    let name = &file_log.base_name;
    if name.trim().is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(ValidationError::InvalidBaseName(name.clone()));
    }

    Ok(())
}

fn validate_retention(config: &Config) -> Result<(), ValidationError> {
    let retention = &config.file_log.retention;
    if !retention.enabled {
        return Ok(());
    }

    if retention.max_age == 0 {
        return Err(ValidationError::ZeroRetentionAge);
    }

    if retention.max_archives == Some(0) {
        return Err(ValidationError::ZeroRetentionCount);
    }

    Ok(())
}
