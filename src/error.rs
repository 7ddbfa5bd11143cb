use thiserror::Error;

use crate::config::ValidationError;
use crate::file_log::FileLogError;

#[derive(Debug, Error)]
pub enum LoggerError {
    /// Used after `shutdown()`; always a bug in the caller
    #[error("logger is not initialized")]
    NotInitialized,

    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("file logger error: {0}")]
    FileLog(#[from] FileLogError),
}

pub type Result<T> = std::result::Result<T, LoggerError>;
