//! Player repository trait and the in-memory implementation.
//!
//! The PostgreSQL implementation lives in [`crate::db::PgPlayerRepository`].

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::errors::{StatsError, StatsResult};
use super::models::{PlayerId, PlayerRecord, StatLine, generate_player_id};

/// Trait for the lifetime player collection
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    /// Find a player by exact display name, creating an empty record if none exists
    async fn get_or_create(&self, name: &str) -> StatsResult<PlayerRecord>;

    /// Find a player by exact display name
    async fn find_by_name(&self, name: &str) -> StatsResult<Option<PlayerRecord>>;

    /// Get a player by ID
    async fn get(&self, player_id: &str) -> StatsResult<PlayerRecord>;

    /// List every player, ordered by name
    async fn list(&self) -> StatsResult<Vec<PlayerRecord>>;

    /// Add a stat line to a player unless the tournament was already applied.
    ///
    /// Returns whether the counters changed.
    async fn apply_stat_line(
        &self,
        player_id: &str,
        tournament_id: &str,
        line: &StatLine,
    ) -> StatsResult<bool>;
}

/// Trim a display name, rejecting blanks
pub(crate) fn clean_name(name: &str) -> StatsResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StatsError::InvalidName(name.to_string()));
    }
    Ok(trimmed)
}

/// In-memory player repository for tests and offline development
#[derive(Clone, Default)]
pub struct MemoryPlayerRepository {
    players: Arc<RwLock<HashMap<PlayerId, PlayerRecord>>>,
}

impl MemoryPlayerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repository with existing records
    pub fn with_players(records: impl IntoIterator<Item = PlayerRecord>) -> Self {
        let players = records.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self {
            players: Arc::new(RwLock::new(players)),
        }
    }
}

#[async_trait]
impl PlayerRepository for MemoryPlayerRepository {
    async fn get_or_create(&self, name: &str) -> StatsResult<PlayerRecord> {
        let name = clean_name(name)?;
        let mut players = self.players.write().await;
        if let Some(existing) = players.values().find(|p| p.name == name) {
            return Ok(existing.clone());
        }

        let record = PlayerRecord::new(generate_player_id(name), name, Utc::now());
        players.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_name(&self, name: &str) -> StatsResult<Option<PlayerRecord>> {
        let name = name.trim();
        let players = self.players.read().await;
        Ok(players.values().find(|p| p.name == name).cloned())
    }

    async fn get(&self, player_id: &str) -> StatsResult<PlayerRecord> {
        self.players
            .read()
            .await
            .get(player_id)
            .cloned()
            .ok_or_else(|| StatsError::PlayerNotFound(player_id.to_string()))
    }

    async fn list(&self) -> StatsResult<Vec<PlayerRecord>> {
        let mut all: Vec<PlayerRecord> = self.players.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn apply_stat_line(
        &self,
        player_id: &str,
        tournament_id: &str,
        line: &StatLine,
    ) -> StatsResult<bool> {
        let mut players = self.players.write().await;
        let record = players
            .get_mut(player_id)
            .ok_or_else(|| StatsError::PlayerNotFound(player_id.to_string()))?;
        Ok(record.apply(tournament_id, line, Utc::now()))
    }
}
