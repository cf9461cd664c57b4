//! Authoritative remote store abstraction.
//!
//! A remote store holds one document per tournament, written wholesale.
//! Every write bumps the document's revision. Stores that can push changes
//! return a stream of revisions from [`RemoteStore::watch`]; the others are
//! polled through [`RemoteStore::revision`].
//!
//! The PostgreSQL implementation lives in [`crate::db::PgTournamentStore`].

use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, broadcast, mpsc};

use super::errors::{SyncError, SyncResult};
use crate::tournament::models::{Tournament, TournamentId};

/// Monotonic per-document revision marker
pub type Revision = i64;

/// Buffer of a per-subscription change stream
pub const CHANGE_BUFFER: usize = 16;

/// Revisions of one tournament, pushed by the store
pub type ChangeStream = mpsc::Receiver<Revision>;

/// A tournament as stored remotely
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    pub tournament: Tournament,
    pub revision: Revision,
}

/// Trait for the authoritative tournament store
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read a tournament
    async fn fetch(&self, id: &str) -> SyncResult<Option<RemoteDocument>>;

    /// Write a tournament wholesale, returning the new revision
    async fn store(&self, tournament: &Tournament) -> SyncResult<Revision>;

    /// Current revision of a tournament, without its body
    async fn revision(&self, id: &str) -> SyncResult<Option<Revision>>;

    /// Delete a tournament; returns whether it existed
    async fn delete(&self, id: &str) -> SyncResult<bool>;

    /// IDs of every stored tournament
    async fn list_ids(&self) -> SyncResult<Vec<TournamentId>>;

    /// Push stream of new revisions for one tournament.
    ///
    /// `None` means the store cannot push and the caller should poll.
    async fn watch(&self, id: &str) -> SyncResult<Option<ChangeStream>>;
}

struct MemoryInner {
    documents: RwLock<HashMap<TournamentId, (String, Revision)>>,
    changes: broadcast::Sender<(TournamentId, Revision)>,
    push_enabled: bool,
    offline: AtomicBool,
    deny_writes: AtomicBool,
    latency_ms: AtomicU64,
}

/// In-memory remote store for tests and offline development.
///
/// Documents are kept serialized so readers never share state with writers.
/// Clones share the same documents.
#[derive(Clone)]
pub struct MemoryRemoteStore {
    inner: Arc<MemoryInner>,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemoteStore {
    /// Push-capable store
    pub fn new() -> Self {
        Self::build(true)
    }

    /// Store without push; subscribers must poll
    pub fn polling_only() -> Self {
        Self::build(false)
    }

    fn build(push_enabled: bool) -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(MemoryInner {
                documents: RwLock::new(HashMap::new()),
                changes,
                push_enabled,
                offline: AtomicBool::new(false),
                deny_writes: AtomicBool::new(false),
                latency_ms: AtomicU64::new(0),
            }),
        }
    }

    /// Simulate losing the connection
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Simulate a rules rejection on writes
    pub fn set_deny_writes(&self, deny: bool) {
        self.inner.deny_writes.store(deny, Ordering::SeqCst);
    }

    /// Delay every operation
    pub fn set_latency(&self, latency: Duration) {
        self.inner
            .latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    async fn gate(&self) -> SyncResult<()> {
        let latency = self.inner.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(SyncError::NetworkUnavailable(
                "memory store is offline".to_string(),
            ));
        }
        Ok(())
    }

    async fn gate_write(&self) -> SyncResult<()> {
        self.gate().await?;
        if self.inner.deny_writes.load(Ordering::SeqCst) {
            return Err(SyncError::PermissionDenied);
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn fetch(&self, id: &str) -> SyncResult<Option<RemoteDocument>> {
        self.gate().await?;
        let documents = self.inner.documents.read().await;
        match documents.get(id) {
            Some((json, revision)) => Ok(Some(RemoteDocument {
                tournament: serde_json::from_str(json)?,
                revision: *revision,
            })),
            None => Ok(None),
        }
    }

    async fn store(&self, tournament: &Tournament) -> SyncResult<Revision> {
        self.gate_write().await?;
        let json = serde_json::to_string(tournament)?;

        let revision = {
            let mut documents = self.inner.documents.write().await;
            let revision = documents.get(&tournament.id).map_or(1, |(_, rev)| rev + 1);
            documents.insert(tournament.id.clone(), (json, revision));
            revision
        };

        // No receivers is fine
        let _ = self.inner.changes.send((tournament.id.clone(), revision));
        Ok(revision)
    }

    async fn revision(&self, id: &str) -> SyncResult<Option<Revision>> {
        self.gate().await?;
        Ok(self.inner.documents.read().await.get(id).map(|(_, rev)| *rev))
    }

    async fn delete(&self, id: &str) -> SyncResult<bool> {
        self.gate_write().await?;
        Ok(self.inner.documents.write().await.remove(id).is_some())
    }

    async fn list_ids(&self) -> SyncResult<Vec<TournamentId>> {
        self.gate().await?;
        let mut ids: Vec<TournamentId> = self.inner.documents.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn watch(&self, id: &str) -> SyncResult<Option<ChangeStream>> {
        if !self.inner.push_enabled {
            return Ok(None);
        }
        self.gate().await?;

        let mut changes = self.inner.changes.subscribe();
        let (tx, rx) = mpsc::channel(CHANGE_BUFFER);
        let id = id.to_string();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    received = changes.recv() => match received {
                        Ok((changed, revision)) if changed == id => {
                            if tx.send(revision).await.is_err() {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            debug!("Change stream for {} lagged by {}", id, skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        Ok(Some(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::models::{Team, TournamentFormat};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn tournament(id: &str) -> Tournament {
        Tournament::new(
            id.to_string(),
            "hash".to_string(),
            TournamentFormat::default(),
            vec![Team::new("red", "Red", "#f00")],
            BTreeMap::new(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_dropped_watch_releases_listener() {
        let store = MemoryRemoteStore::new();
        store.store(&tournament("t1")).await.unwrap();

        let streams: Vec<ChangeStream> = watch_many(&store, 5).await;
        assert_eq!(store.inner.changes.receiver_count(), 5);
        drop(streams);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.inner.changes.receiver_count(), 0);
    }

    async fn watch_many(store: &MemoryRemoteStore, n: usize) -> Vec<ChangeStream> {
        let mut streams = Vec::with_capacity(n);
        for _ in 0..n {
            streams.push(store.watch("t1").await.unwrap().unwrap());
        }
        streams
    }

    #[tokio::test]
    async fn test_store_bumps_revision() {
        let store = MemoryRemoteStore::new();
        assert_eq!(store.revision("t1").await.unwrap(), None);

        assert_eq!(store.store(&tournament("t1")).await.unwrap(), 1);
        assert_eq!(store.store(&tournament("t1")).await.unwrap(), 2);

        let doc = store.fetch("t1").await.unwrap().unwrap();
        assert_eq!(doc.revision, 2);
        assert_eq!(doc.tournament.id, "t1");
        assert_eq!(store.list_ids().await.unwrap(), vec!["t1".to_string()]);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryRemoteStore::new();
        store.set_deny_writes(true);
        assert!(matches!(
            store.store(&tournament("t1")).await,
            Err(SyncError::PermissionDenied)
        ));

        store.set_deny_writes(false);
        store.set_offline(true);
        assert!(matches!(
            store.fetch("t1").await,
            Err(SyncError::NetworkUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_watch_filters_by_id() {
        let store = MemoryRemoteStore::new();
        let mut changes = store.watch("t1").await.unwrap().unwrap();

        store.store(&tournament("t2")).await.unwrap();
        store.store(&tournament("t1")).await.unwrap();

        assert_eq!(changes.recv().await, Some(1));
    }

    #[tokio::test]
    async fn test_polling_only_store_does_not_push() {
        let store = MemoryRemoteStore::polling_only();
        assert!(store.watch("t1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryRemoteStore::new();
        store.store(&tournament("t1")).await.unwrap();
        assert!(store.delete("t1").await.unwrap());
        assert!(!store.delete("t1").await.unwrap());
        assert!(store.fetch("t1").await.unwrap().is_none());
    }
}
