//! Application layer errors

use std::path::PathBuf;
use thiserror::Error;

/// General guestbook errors
#[derive(Error, Debug)]
pub enum GuestbookError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server not ready after {0:?}")]
    NotReady(std::time::Duration),
}

/// Rejected submissions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("message must not be empty")]
    EmptyContent,
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Message sequence exhausted after {0}")]
    SequenceExhausted(u64),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for GuestbookError {
    fn from(e: reqwest::Error) -> Self {
        GuestbookError::Network(e.to_string())
    }
}
