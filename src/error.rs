use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures of a heartbeat store write.
///
/// Read failures never surface here: an unreadable log is treated as empty.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to persist heartbeat log at {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to lock heartbeat log at {}: {source}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode heartbeat log: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("redis backend error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("store task failed: {0}")]
    Task(String),
}

/// Failures of a heartbeat or query call made by the client agent.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("presence request timed out after {0:?}")]
    Timeout(Duration),

    #[error("presence request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("presence server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("presence store unavailable: {0}")]
    Store(#[from] StoreError),
}

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, value: &str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
