use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileLogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("log file is not open")]
    NotOpen,

    #[error("log file writer is closed")]
    Closed,

    #[error("writer thread panicked")]
    WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, FileLogError>;
