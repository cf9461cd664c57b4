//! Standings and awards.
//!
//! Everything here is a pure function of a tournament snapshot and is
//! recomputed on every read:
//! - [`compute_standings`]: the ranked league table
//! - [`compute_leaderboard`]: player and team awards
//!
//! ## Tie-break cascade
//!
//! 1. Points (3 for a win, 1 for a draw)
//! 2. Goal difference
//! 3. Head-to-head among the teams still level: a mini-league of their mutual
//!    matches, by points then goal difference
//! 4. Goals for
//! 5. Clean sheets
//! 6. Registration order

pub mod calculator;
pub mod leaderboard;

pub use calculator::{
    POINTS_DRAW, POINTS_WIN, StandingsRow, compute_standings, qualifiers, rank_of,
};
pub use leaderboard::{AwardedPlayer, Leaderboard, PlayerAward, TeamAward, compute_leaderboard};
