//! Storage and synchronization error types.

use std::time::Duration;
use thiserror::Error;

/// Sync layer errors
#[derive(Debug, Error)]
pub enum SyncError {
    /// A stored document could not be decoded
    #[error("Failed to parse stored tournament: {0}")]
    ParseFailure(String),

    /// Writing would exceed the local storage quota
    #[error("Local storage quota exceeded: need {needed} bytes, limit is {limit}")]
    QuotaExceeded { needed: usize, limit: usize },

    /// The remote store rejected the operation
    #[error("Permission denied by remote store")]
    PermissionDenied,

    /// The remote store cannot be reached
    #[error("Remote store unavailable: {0}")]
    NetworkUnavailable(String),

    /// The operation did not finish in time
    #[error("Storage operation timed out after {0:?}")]
    Timeout(Duration),

    /// No document with this ID
    #[error("Tournament not found: {0}")]
    NotFound(String),

    /// Any other remote store failure
    #[error("Remote store error: {0}")]
    Backend(String),

    /// Local file I/O failure
    #[error("Local storage I/O error: {0}")]
    LocalIo(#[from] std::io::Error),
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::ParseFailure(err.to_string())
    }
}

impl SyncError {
    /// Whether the failure is transient and a cached copy may stand in
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::NetworkUnavailable(_) | SyncError::Timeout(_))
    }

    /// Get a client-safe error message
    ///
    /// Backend details are not exposed.
    pub fn client_message(&self) -> String {
        match self {
            SyncError::Backend(_) | SyncError::LocalIo(_) => "Internal server error".to_string(),
            SyncError::NetworkUnavailable(_) => "Storage temporarily unavailable".to_string(),
            SyncError::ParseFailure(_) => "Stored tournament is corrupted".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
