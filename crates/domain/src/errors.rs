//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Cadence
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum CadenceError {
    #[error("Invalid timer configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Sync is disabled")]
    SyncDisabled,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Remote rejected request: {reason}")]
    RemoteRejected { reason: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CadenceError {
    /// True for failures produced by a remote sync client.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized | Self::NetworkUnavailable(_) | Self::RemoteRejected { .. }
        )
    }

    /// Only transport failures are worth retrying; auth and rejections are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkUnavailable(_))
    }

    /// Shorthand for [`CadenceError::RemoteRejected`].
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::RemoteRejected { reason: reason.into() }
    }
}

/// Result type alias for Cadence operations
pub type Result<T> = std::result::Result<T, CadenceError>;
