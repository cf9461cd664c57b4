//! Sync layer configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use super::timeouts::DEFAULT_OPERATION_TIMEOUT;

/// Default polling interval for subscriptions without push (2 seconds)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Default local cache quota (5 MiB)
pub const DEFAULT_CACHE_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Sync configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Interval between remote revision checks for polling subscriptions
    pub poll_interval: Duration,

    /// Upper bound for a single remote operation
    pub operation_timeout: Duration,

    /// File backing the local cache; `None` keeps the cache in memory
    pub cache_path: Option<PathBuf>,

    /// Maximum size of the serialized cache blob; `None` is unlimited
    pub cache_quota_bytes: Option<usize>,
}

impl SyncConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `SYNC_POLL_INTERVAL_MS`: polling interval (default: 2000)
    /// - `SYNC_OPERATION_TIMEOUT_MS`: remote operation timeout (default: 5000)
    /// - `SYNC_CACHE_PATH`: cache file (default: in memory)
    /// - `SYNC_CACHE_QUOTA_BYTES`: cache quota, `0` for unlimited (default: 5 MiB)
    pub fn from_env() -> Self {
        let millis = |key: &str, default: Duration| {
            env::var(key)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        let cache_quota_bytes = match env::var("SYNC_CACHE_QUOTA_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
        {
            Some(0) => None,
            Some(bytes) => Some(bytes),
            None => Some(DEFAULT_CACHE_QUOTA_BYTES),
        };

        Self {
            poll_interval: millis("SYNC_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL),
            operation_timeout: millis("SYNC_OPERATION_TIMEOUT_MS", DEFAULT_OPERATION_TIMEOUT),
            cache_path: env::var("SYNC_CACHE_PATH")
                .ok()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            cache_quota_bytes,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            cache_path: None,
            cache_quota_bytes: Some(DEFAULT_CACHE_QUOTA_BYTES),
        }
    }
}
