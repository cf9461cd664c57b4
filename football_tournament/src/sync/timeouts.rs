//! Timeout wrappers for remote store operations.
//!
//! Every remote call is bounded; a call that runs out of time becomes
//! [`SyncError::Timeout`] and is never retried here.

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use super::errors::{SyncError, SyncResult};

/// Default timeout for a single remote operation (5 seconds)
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Execute a remote operation with a timeout
///
/// # Example
///
/// ```
/// use football_tournament::sync::timeouts::with_timeout;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let value = with_timeout(Duration::from_millis(50), async { Ok(7) }).await;
/// assert_eq!(value.unwrap(), 7);
/// # }
/// ```
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> SyncResult<T>
where
    F: Future<Output = SyncResult<T>>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(SyncError::Timeout(duration)),
    }
}

/// Execute a remote operation with the default timeout
pub async fn with_default_timeout<F, T>(future: F) -> SyncResult<T>
where
    F: Future<Output = SyncResult<T>>,
{
    with_timeout(DEFAULT_OPERATION_TIMEOUT, future).await
}
