//! Tournament manager: admin-gated writes and recomputed reads.
//!
//! Every write loads the latest snapshot, verifies the admin secret, applies a
//! pure reducer or progression step and saves the result through the
//! [`SyncCoordinator`]. Lifetime player statistics are folded once, when the
//! tournament reaches `completed`.

use chrono::Utc;
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use super::admin::AdminSecretHasher;
use super::config::TournamentConfig;
use super::errors::{TournamentError, TournamentResult};
use super::models::{
    MatchEvent, MatchId, Phase, Team, Tournament, TournamentId, generate_tournament_id,
};
use super::progression::{self, PreconditionNotMet};
use super::reducer;
use super::share;
use super::view::TournamentView;
use crate::standings::{Leaderboard, StandingsRow, compute_leaderboard, compute_standings};
use crate::stats::{PlayerRecord, PlayerRepository, apply_tournament_stats, tally_tournament};
use crate::sync::{SubscriptionHandle, SyncCoordinator, SyncError};

/// A team as submitted at creation: player display names, not IDs
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSetup {
    pub key: String,
    pub display_name: String,
    pub color_token: String,
    #[serde(default)]
    pub players: Vec<String>,
}

impl TeamSetup {
    pub fn new(key: &str, display_name: &str, color_token: &str, players: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            display_name: display_name.to_string(),
            color_token: color_token.to_string(),
            players: players.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Result of an explicit advance request
#[derive(Debug, Clone)]
pub enum Progress {
    /// The tournament moved on and was saved
    Advanced(Tournament),
    /// Nothing changed
    Unchanged {
        tournament: Tournament,
        reason: PreconditionNotMet,
    },
}

/// Tournament manager
#[derive(Clone)]
pub struct TournamentManager {
    sync: Arc<SyncCoordinator>,
    players: Arc<dyn PlayerRepository>,
    hasher: AdminSecretHasher,
    config: TournamentConfig,
}

impl TournamentManager {
    pub fn new(
        sync: Arc<SyncCoordinator>,
        players: Arc<dyn PlayerRepository>,
        hasher: AdminSecretHasher,
        config: TournamentConfig,
    ) -> Self {
        Self {
            sync,
            players,
            hasher,
            config,
        }
    }

    pub fn sync(&self) -> &SyncCoordinator {
        &self.sync
    }

    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }

    /// Create a tournament in the setup phase.
    ///
    /// Players are resolved by exact display name against the player
    /// repository, creating records for new names.
    pub async fn create_tournament(
        &self,
        admin_secret: &str,
        teams: Vec<TeamSetup>,
    ) -> TournamentResult<Tournament> {
        self.config.validate()?;
        if teams.len() < 2 {
            return Err(TournamentError::NotEnoughTeams {
                needed: 2,
                current: teams.len(),
            });
        }

        let mut keys = HashSet::new();
        for team in &teams {
            if team.key.trim().is_empty() {
                return Err(TournamentError::InvalidTeamKey(team.key.clone()));
            }
            if !keys.insert(team.key.as_str()) {
                return Err(TournamentError::DuplicateTeam(team.key.clone()));
            }
        }

        let admin_secret_hash = self.hasher.hash(admin_secret)?;

        let mut players: BTreeMap<String, PlayerRecord> = BTreeMap::new();
        let mut registered = Vec::with_capacity(teams.len());
        for setup in teams {
            let mut roster = Vec::with_capacity(setup.players.len());
            for name in &setup.players {
                let record = self.players.get_or_create(name).await?;
                if players.contains_key(&record.id) {
                    return Err(TournamentError::DuplicatePlayer(name.clone()));
                }
                roster.push(record.id.clone());
                players.insert(record.id.clone(), record);
            }
            registered.push(
                Team::new(&setup.key, &setup.display_name, &setup.color_token).with_roster(roster),
            );
        }

        let now = Utc::now();
        let tournament = Tournament::new(
            generate_tournament_id(now),
            admin_secret_hash,
            self.config.format(),
            registered,
            players,
            now,
        );
        self.sync.save(&tournament).await?;

        info!(
            "Created tournament {} with {} teams",
            tournament.id,
            tournament.teams.len()
        );
        Ok(tournament)
    }

    /// Latest snapshot
    pub async fn load(&self, id: &str) -> TournamentResult<Tournament> {
        self.sync.load(id).await.map_err(|e| match e {
            SyncError::NotFound(_) => TournamentError::NotFound(id.to_string()),
            other => other.into(),
        })
    }

    /// Check the admin secret without changing anything
    pub async fn verify_admin(&self, id: &str, admin_secret: &str) -> TournamentResult<()> {
        self.authorize(id, admin_secret).await.map(|_| ())
    }

    async fn authorize(&self, id: &str, admin_secret: &str) -> TournamentResult<Tournament> {
        let tournament = self.load(id).await?;
        self.hasher
            .verify(admin_secret, &tournament.admin_secret_hash)
            .map_err(|e| {
                warn!("Rejected admin secret for tournament {}", id);
                e
            })?;
        Ok(tournament)
    }

    /// Save a new snapshot, folding stats into it when it just completed
    async fn persist(&self, mut next: Tournament) -> TournamentResult<Tournament> {
        let completed = next.phase == Phase::Completed;
        if completed {
            let players = std::mem::take(&mut next.players);
            next.players = apply_tournament_stats(&next, players, Utc::now());
        }

        let outcome = self.sync.save(&next).await?;
        if let Some(warning) = outcome.cache_warning {
            warn!("Tournament {} saved with cache warning: {}", next.id, warning);
        }

        if completed {
            info!(
                "Tournament {} completed, champion {:?}",
                next.id, next.champion
            );
            self.fold_lifetime_stats(&next).await;
        }
        Ok(next)
    }

    /// Apply the tournament to the player repository; returns how many records changed
    async fn fold_lifetime_stats(&self, tournament: &Tournament) -> usize {
        let mut applied = 0;
        for (player_id, line) in tally_tournament(tournament) {
            match self
                .players
                .apply_stat_line(&player_id, &tournament.id, &line)
                .await
            {
                Ok(true) => applied += 1,
                Ok(false) => debug!(
                    "Player {} already has tournament {}",
                    player_id, tournament.id
                ),
                Err(e) => warn!(
                    "Failed to record stats for player {} in tournament {}: {}",
                    player_id, tournament.id, e
                ),
            }
        }
        applied
    }

    /// Re-run the lifetime stats fold of a completed tournament.
    ///
    /// Safe to repeat: players that already have the tournament are skipped.
    pub async fn record_lifetime_stats(
        &self,
        id: &str,
        admin_secret: &str,
    ) -> TournamentResult<usize> {
        let tournament = self.authorize(id, admin_secret).await?;
        if tournament.phase != Phase::Completed {
            return Err(TournamentError::InvalidPhase {
                expected: Phase::Completed,
                actual: tournament.phase,
            });
        }
        Ok(self.fold_lifetime_stats(&tournament).await)
    }

    /// Remove a tournament from the remote store and the cache.
    ///
    /// Lifetime statistics already folded into the player repository stay.
    pub async fn delete_tournament(&self, id: &str, admin_secret: &str) -> TournamentResult<()> {
        self.authorize(id, admin_secret).await?;
        if !self.sync.delete(id).await? {
            return Err(TournamentError::NotFound(id.to_string()));
        }
        info!("Deleted tournament {}", id);
        Ok(())
    }

    /// Generate fixtures and start the group stage
    pub async fn begin_group_stage(
        &self,
        id: &str,
        admin_secret: &str,
    ) -> TournamentResult<Tournament> {
        let tournament = self.authorize(id, admin_secret).await?;
        let next = progression::begin_group_stage(&tournament)?;
        self.persist(next).await
    }

    /// Attempt the next progression step.
    ///
    /// An unmet precondition is not an error: the unchanged snapshot comes
    /// back with the reason.
    pub async fn advance(&self, id: &str, admin_secret: &str) -> TournamentResult<Progress> {
        let tournament = self.authorize(id, admin_secret).await?;
        match progression::advance(&tournament) {
            Ok(next) => Ok(Progress::Advanced(self.persist(next).await?)),
            Err(reason) => {
                info!("Tournament {} not advanced: {}", id, reason);
                Ok(Progress::Unchanged { tournament, reason })
            }
        }
    }

    pub async fn start_match(
        &self,
        id: &str,
        admin_secret: &str,
        match_id: MatchId,
        keeper1: Option<&str>,
        keeper2: Option<&str>,
    ) -> TournamentResult<Tournament> {
        let tournament = self.authorize(id, admin_secret).await?;
        let next = reducer::start_match(&tournament, match_id, keeper1, keeper2, Utc::now())?;
        self.persist(next).await
    }

    pub async fn record_event(
        &self,
        id: &str,
        admin_secret: &str,
        match_id: MatchId,
        event: MatchEvent,
    ) -> TournamentResult<Tournament> {
        let tournament = self.authorize(id, admin_secret).await?;
        let next = reducer::record_event(&tournament, match_id, event)?;
        self.persist(next).await
    }

    /// Complete a match, then try knockout progression when configured
    pub async fn complete_match(
        &self,
        id: &str,
        admin_secret: &str,
        match_id: MatchId,
    ) -> TournamentResult<Tournament> {
        let tournament = self.authorize(id, admin_secret).await?;
        let mut next = reducer::complete_match(&tournament, match_id)?;

        if self.config.auto_advance && next.phase == Phase::Knockout {
            match progression::advance(&next) {
                Ok(advanced) => next = advanced,
                Err(reason) => debug!("Tournament {} stays in knockout: {}", id, reason),
            }
        }
        self.persist(next).await
    }

    /// Group stage table
    pub async fn standings(&self, id: &str) -> TournamentResult<Vec<StandingsRow>> {
        let tournament = self.load(id).await?;
        let group: Vec<_> = tournament.group_matches().cloned().collect();
        Ok(compute_standings(&group, &tournament.teams))
    }

    pub async fn leaderboard(&self, id: &str) -> TournamentResult<Leaderboard> {
        Ok(compute_leaderboard(&self.load(id).await?))
    }

    pub async fn view(&self, id: &str) -> TournamentResult<TournamentView> {
        Ok(TournamentView::from_tournament(&self.load(id).await?))
    }

    pub async fn list(&self) -> TournamentResult<Vec<TournamentId>> {
        Ok(self.sync.list().await?)
    }

    /// Lifetime records of every player
    pub async fn players(&self) -> TournamentResult<Vec<PlayerRecord>> {
        Ok(self.players.list().await?)
    }

    /// Watch a tournament; the callback receives fresh views
    pub async fn subscribe<F>(&self, id: &str, on_change: F) -> SubscriptionHandle
    where
        F: Fn(TournamentView) + Send + Sync + 'static,
    {
        self.sync
            .subscribe(id, move |t| on_change(TournamentView::from_tournament(&t)))
            .await
    }

    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        self.sync.unsubscribe(handle)
    }

    pub fn share_link(&self, base_url: &str, id: &str) -> String {
        share::share_link(base_url, id)
    }
}
