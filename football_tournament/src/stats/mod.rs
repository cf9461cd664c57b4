//! Lifetime player statistics.
//!
//! This module provides:
//! - Player records and the additive, per-tournament-guarded merge
//! - Tallying of completed matches into per-player stat lines
//! - The player repository abstraction with an in-memory implementation
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use football_tournament::stats::{PlayerRecord, StatLine};
//!
//! let mut record = PlayerRecord::new("sam_x1y2z".to_string(), "Sam", Utc::now());
//! let line = StatLine { games_played: 1, goals: 2, ..StatLine::default() };
//!
//! assert!(record.apply("tournament_1", &line, Utc::now()));
//! // The same tournament is never counted twice
//! assert!(!record.apply("tournament_1", &line, Utc::now()));
//! assert_eq!(record.goals, 2);
//! ```

pub mod aggregator;
pub mod errors;
pub mod models;
pub mod repository;

pub use aggregator::{
    PlayerStore, Tally, apply_match_stats, apply_tally, apply_tournament_stats, tally_match,
    tally_tournament,
};
pub use errors::{StatsError, StatsResult};
pub use models::{PlayerId, PlayerRecord, StatLine, generate_player_id, normalize_name};
pub use repository::{MemoryPlayerRepository, PlayerRepository};
