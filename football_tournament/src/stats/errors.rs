//! Player statistics error types.

use thiserror::Error;

/// Player statistics errors
#[derive(Debug, Error)]
pub enum StatsError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Player not found
    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    /// Name is empty after trimming
    #[error("Invalid player name: {0:?}")]
    InvalidName(String),

    /// Counter left the range the store can hold
    #[error("Counter overflow for player {0}")]
    CounterOverflow(String),
}

impl StatsError {
    /// Get a client-safe error message
    pub fn client_message(&self) -> String {
        match self {
            StatsError::Database(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for player statistics operations
pub type StatsResult<T> = Result<T, StatsError>;
