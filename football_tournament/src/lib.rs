//! # Football Tournament
//!
//! Tournament manager for small football (five-a-side) tournaments: a group
//! stage played as a round robin, followed by a knockout bracket.
//!
//! The tournament document is the single source of truth. Standings, awards
//! and the bracket view are recomputed from it on every read; writes are
//! admin-gated and go through a write-through sync layer that keeps an
//! authoritative remote store and a local cache.
//!
//! ## Lifecycle
//!
//! - **Setup**: teams and rosters are registered
//! - **GroupStage**: every team plays every other team once
//! - **Knockout**: top qualifiers play semifinals (or go straight to the final)
//! - **Completed**: a champion is set and lifetime player stats are folded
//!
//! ## Core Modules
//!
//! - [`tournament`]: data model, reducers, progression and the manager
//! - [`standings`]: league table with tie-breaks, awards
//! - [`stats`]: lifetime player records
//! - [`sync`]: local cache, remote store and subscriptions
//! - [`db`]: PostgreSQL remote store and player repository
//!
//! ## Example
//!
//! ```
//! use football_tournament::{Team, compute_standings};
//!
//! let teams = vec![Team::new("red", "Red", "#e53935"), Team::new("black", "Black", "#212121")];
//! let table = compute_standings(&[], &teams);
//! assert_eq!(table[0].team_key, "red");
//! assert_eq!(table[0].points, 0);
//! ```

/// PostgreSQL persistence.
pub mod db;

/// League table and awards.
pub mod standings;
pub use standings::{Leaderboard, StandingsRow, compute_leaderboard, compute_standings};

/// Lifetime player statistics.
pub mod stats;
pub use stats::{PlayerRecord, PlayerRepository, StatLine};

/// Local cache and remote synchronisation.
pub mod sync;
pub use sync::{SyncCoordinator, SyncError};

/// Tournament model, lifecycle and management.
pub mod tournament;
pub use tournament::{
    Match, MatchEvent, Phase, Team, Tournament, TournamentError, TournamentManager,
    TournamentView,
};
