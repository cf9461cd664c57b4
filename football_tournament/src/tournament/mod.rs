//! Tournament lifecycle: data model, match reducers and round progression.
//!
//! This module provides:
//! - The tournament document and its matches, teams and events
//! - Pure reducers for starting, scoring and completing matches
//! - The setup, group stage, knockout, completed progression
//! - Admin secret hashing and share links
//! - [`TournamentManager`], which ties these to sync and player stats
//!
//! ## Example
//!
//! ```
//! use football_tournament::stats::MemoryPlayerRepository;
//! use football_tournament::sync::{LocalCache, MemoryRemoteStore, SyncConfig, SyncCoordinator};
//! use football_tournament::tournament::{
//!     AdminSecretHasher, Phase, TeamSetup, TournamentConfig, TournamentManager,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sync = SyncCoordinator::new(
//!         Arc::new(MemoryRemoteStore::new()),
//!         Arc::new(LocalCache::in_memory()),
//!         SyncConfig::default(),
//!     );
//!     let manager = TournamentManager::new(
//!         Arc::new(sync),
//!         Arc::new(MemoryPlayerRepository::new()),
//!         AdminSecretHasher::new("pepper".to_string()),
//!         TournamentConfig::default(),
//!     );
//!
//!     let tournament = manager
//!         .create_tournament(
//!             "1234",
//!             vec![
//!                 TeamSetup::new("red", "Red", "#e53935", &["Ali"]),
//!                 TeamSetup::new("black", "Black", "#212121", &["Kim"]),
//!             ],
//!         )
//!         .await?;
//!
//!     let tournament = manager.begin_group_stage(&tournament.id, "1234").await?;
//!     assert_eq!(tournament.phase, Phase::GroupStage);
//!     Ok(())
//! }
//! ```

pub mod admin;
pub mod config;
pub mod errors;
pub mod manager;
pub mod models;
pub mod progression;
pub mod reducer;
pub mod share;
pub mod view;

pub use admin::AdminSecretHasher;
pub use config::TournamentConfig;
pub use errors::{TournamentError, TournamentResult};
pub use manager::{Progress, TeamSetup, TournamentManager};
pub use models::{
    EventKind, Match, MatchEvent, MatchId, MatchStatus, Outcome, Phase, Round, Side, Team,
    TeamKey, Tournament, TournamentFormat, TournamentId,
};
pub use progression::{PreconditionNotMet, advance, begin_group_stage};
pub use reducer::{complete_match, record_event, start_match};
pub use share::{parse_share_link, share_link};
pub use view::TournamentView;
