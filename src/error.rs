//! Error types for memory-sync

use thiserror::Error;

/// Result type alias for memory-sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Main error type for memory-sync
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Memory service returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Check if error is retryable.
    ///
    /// Nothing retries today; this only feeds the log line of a dropped batch.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            SyncError::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(e: toml::de::Error) -> Self {
        SyncError::Config(e.to_string())
    }
}
