//! Coordinates the local cache with the authoritative remote store.
//!
//! - `save` writes the remote store first and mirrors into the cache only
//!   after the remote write succeeded
//! - `load` reads the remote store and refreshes the cache, falling back to
//!   the cached copy when the remote store is unreachable
//! - `delete` removes the remote document first, then the cached copy
//! - `subscribe` uses the store's push stream when it has one and otherwise
//!   polls revisions at a fixed interval
//!
//! Concurrent writers are last-write-wins. There is no merge and no
//! optimistic concurrency check.

use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::config::SyncConfig;
use super::errors::{SyncError, SyncResult};
use super::local::LocalCache;
use super::remote::{ChangeStream, RemoteStore, Revision};
use super::timeouts::with_timeout;
use crate::tournament::models::{Tournament, TournamentId};

/// Floor for the polling interval
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Result of a successful save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Revision assigned by the remote store
    pub revision: Revision,
    /// Set when the remote write succeeded but the cache mirror failed
    pub cache_warning: Option<String>,
}

/// How a subscription learns about changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionMode {
    Push,
    Polling,
}

/// Handle returned by [`SyncCoordinator::subscribe`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    id: u64,
    tournament_id: TournamentId,
    mode: SubscriptionMode,
}

impl SubscriptionHandle {
    pub fn tournament_id(&self) -> &str {
        &self.tournament_id
    }

    pub fn mode(&self) -> SubscriptionMode {
        self.mode
    }
}

/// Change callback
pub type OnChange = Arc<dyn Fn(Tournament) + Send + Sync>;

/// Cache plus remote store
pub struct SyncCoordinator {
    remote: Arc<dyn RemoteStore>,
    cache: Arc<LocalCache>,
    config: SyncConfig,
    subscriptions: Mutex<HashMap<u64, JoinHandle<()>>>,
    next_subscription: AtomicU64,
}

impl SyncCoordinator {
    pub fn new(remote: Arc<dyn RemoteStore>, cache: Arc<LocalCache>, config: SyncConfig) -> Self {
        Self {
            remote,
            cache,
            config,
            subscriptions: Mutex::new(HashMap::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Build the cache described by the configuration
    pub fn with_config(remote: Arc<dyn RemoteStore>, config: SyncConfig) -> Self {
        let cache = match &config.cache_path {
            Some(path) => LocalCache::file(path, config.cache_quota_bytes),
            None => LocalCache::new(
                Box::new(super::local::MemoryBlob::new()),
                config.cache_quota_bytes,
            ),
        };
        Self::new(remote, Arc::new(cache), config)
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Load a tournament, preferring the remote copy
    pub async fn load(&self, id: &str) -> SyncResult<Tournament> {
        match with_timeout(self.config.operation_timeout, self.remote.fetch(id)).await {
            Ok(Some(doc)) => {
                mirror(&self.cache, &doc.tournament);
                Ok(doc.tournament)
            }
            Ok(None) => Err(SyncError::NotFound(id.to_string())),
            Err(e) if e.is_retryable() => match self.cache.get(id) {
                Ok(Some(cached)) => {
                    warn!("Remote unavailable ({}), serving cached tournament {}", e, id);
                    Ok(cached)
                }
                Ok(None) => Err(e),
                Err(cache_err) => {
                    warn!("Cache read for {} failed: {}", id, cache_err);
                    Err(e)
                }
            },
            Err(e) => Err(e),
        }
    }

    /// Cached copy only; never touches the remote store
    pub fn load_cached(&self, id: &str) -> SyncResult<Option<Tournament>> {
        self.cache.get(id)
    }

    /// Write a tournament: remote first, then the cache.
    ///
    /// A remote failure leaves the cache untouched. A cache failure after a
    /// successful remote write is reported in the outcome, not retried.
    pub async fn save(&self, tournament: &Tournament) -> SyncResult<SaveOutcome> {
        let revision = with_timeout(self.config.operation_timeout, self.remote.store(tournament))
            .await
            .map_err(|e| {
                warn!("Saving tournament {} failed: {}", tournament.id, e);
                e
            })?;

        let cache_warning = match self.cache.put(tournament) {
            Ok(()) => None,
            Err(e) => {
                warn!("Tournament {} saved but not cached: {}", tournament.id, e);
                Some(e.to_string())
            }
        };

        debug!("Saved tournament {} at revision {}", tournament.id, revision);
        Ok(SaveOutcome {
            revision,
            cache_warning,
        })
    }

    /// Delete a tournament: remote first, then the cache.
    ///
    /// Returns whether the remote store held it. A remote failure leaves the
    /// cache untouched; a cache failure afterwards is logged, not retried.
    pub async fn delete(&self, id: &str) -> SyncResult<bool> {
        let existed = with_timeout(self.config.operation_timeout, self.remote.delete(id))
            .await
            .map_err(|e| {
                warn!("Deleting tournament {} failed: {}", id, e);
                e
            })?;

        if let Err(e) = self.cache.remove(id) {
            warn!("Tournament {} deleted but still cached: {}", id, e);
        }

        debug!("Deleted tournament {} (existed: {})", id, existed);
        Ok(existed)
    }

    /// IDs of every tournament, from the cache when the remote store is unreachable
    pub async fn list(&self) -> SyncResult<Vec<TournamentId>> {
        match with_timeout(self.config.operation_timeout, self.remote.list_ids()).await {
            Err(e) if e.is_retryable() => {
                warn!("Remote unavailable ({}), listing cached tournaments", e);
                self.cache.ids()
            }
            other => other,
        }
    }

    /// Watch a tournament. The callback receives the current snapshot first and
    /// then every changed snapshot until the subscription is dropped.
    pub async fn subscribe<F>(&self, id: &str, on_change: F) -> SubscriptionHandle
    where
        F: Fn(Tournament) + Send + Sync + 'static,
    {
        let stream = match with_timeout(self.config.operation_timeout, self.remote.watch(id)).await
        {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Push unavailable for {} ({}), polling instead", id, e);
                None
            }
        };
        let mode = if stream.is_some() {
            SubscriptionMode::Push
        } else {
            SubscriptionMode::Polling
        };

        let task = SubscriptionTask {
            remote: Arc::clone(&self.remote),
            cache: Arc::clone(&self.cache),
            tournament_id: id.to_string(),
            poll_interval: self.config.poll_interval,
            operation_timeout: self.config.operation_timeout,
            on_change: Arc::new(on_change),
            last_revision: None,
        };

        let handle_id = self.next_subscription.fetch_add(1, Ordering::SeqCst);
        let join = tokio::spawn(task.run(stream));
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle_id, join);

        info!("Subscribed to tournament {} ({:?})", id, mode);
        SubscriptionHandle {
            id: handle_id,
            tournament_id: id.to_string(),
            mode,
        }
    }

    /// Stop a subscription; returns whether it was active
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        let task = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle.id);
        match task {
            Some(task) => {
                task.abort();
                debug!("Unsubscribed from tournament {}", handle.tournament_id);
                true
            }
            None => false,
        }
    }

    /// Number of live subscriptions
    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Drop for SyncCoordinator {
    fn drop(&mut self) {
        let subscriptions = self
            .subscriptions
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        for (_, task) in subscriptions.drain() {
            task.abort();
        }
    }
}

fn mirror(cache: &LocalCache, tournament: &Tournament) {
    if let Err(e) = cache.put(tournament) {
        warn!("Failed to cache tournament {}: {}", tournament.id, e);
    }
}

struct SubscriptionTask {
    remote: Arc<dyn RemoteStore>,
    cache: Arc<LocalCache>,
    tournament_id: TournamentId,
    poll_interval: Duration,
    operation_timeout: Duration,
    on_change: OnChange,
    last_revision: Option<Revision>,
}

impl SubscriptionTask {
    async fn run(mut self, stream: Option<ChangeStream>) {
        self.refresh().await;

        if let Some(mut stream) = stream {
            while let Some(revision) = stream.recv().await {
                if self.last_revision != Some(revision) {
                    self.refresh().await;
                }
            }
            warn!(
                "Change stream for {} closed, falling back to polling",
                self.tournament_id
            );
        }

        let mut interval = tokio::time::interval(self.poll_interval.max(MIN_POLL_INTERVAL));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.poll().await;
        }
    }

    async fn poll(&mut self) {
        match with_timeout(self.operation_timeout, self.remote.revision(&self.tournament_id)).await
        {
            Ok(Some(revision)) if self.last_revision != Some(revision) => self.refresh().await,
            Ok(_) => {}
            Err(e) => debug!("Polling {} failed: {}", self.tournament_id, e),
        }
    }

    async fn refresh(&mut self) {
        match with_timeout(self.operation_timeout, self.remote.fetch(&self.tournament_id)).await {
            Ok(Some(doc)) => {
                if self.last_revision == Some(doc.revision) {
                    return;
                }
                self.last_revision = Some(doc.revision);
                mirror(&self.cache, &doc.tournament);
                (self.on_change)(doc.tournament);
            }
            Ok(None) => debug!("Tournament {} not found yet", self.tournament_id),
            Err(e) => debug!("Refreshing {} failed: {}", self.tournament_id, e),
        }
    }
}
