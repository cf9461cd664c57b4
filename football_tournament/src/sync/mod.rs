//! Dual-store synchronization.
//!
//! This module provides:
//! - [`LocalCache`]: synchronous, always-available, non-authoritative cache
//! - [`RemoteStore`]: the authoritative async store abstraction, with an
//!   in-memory implementation
//! - [`SyncCoordinator`]: write-through saves, read-through loads and
//!   push-or-poll subscriptions
//!
//! ## Example
//!
//! ```
//! use football_tournament::sync::{LocalCache, MemoryRemoteStore, SyncConfig, SyncCoordinator};
//! use std::sync::Arc;
//!
//! let sync = SyncCoordinator::new(
//!     Arc::new(MemoryRemoteStore::new()),
//!     Arc::new(LocalCache::in_memory()),
//!     SyncConfig::default(),
//! );
//! assert_eq!(sync.active_subscriptions(), 0);
//! ```

pub mod config;
pub mod coordinator;
pub mod errors;
pub mod local;
pub mod remote;
pub mod timeouts;

pub use config::{DEFAULT_CACHE_QUOTA_BYTES, DEFAULT_POLL_INTERVAL, SyncConfig};
pub use coordinator::{
    OnChange, SaveOutcome, SubscriptionHandle, SubscriptionMode, SyncCoordinator,
};
pub use errors::{SyncError, SyncResult};
pub use local::{BlobStorage, FileBlob, LocalCache, MemoryBlob};
pub use remote::{ChangeStream, MemoryRemoteStore, RemoteDocument, RemoteStore, Revision};
