//! Tournament error types.

use thiserror::Error;

use super::models::{MatchId, MatchStatus, Phase, Round, TournamentId};
use super::progression::PreconditionNotMet;
use crate::stats::StatsError;
use crate::sync::SyncError;

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    #[error("Invalid team key: {0:?}")]
    InvalidTeamKey(String),

    #[error("Duplicate team key: {0}")]
    DuplicateTeam(String),

    #[error("Player {0} is listed more than once")]
    DuplicatePlayer(String),

    #[error("Player {player} is not on team {team}")]
    PlayerNotOnTeam { player: String, team: String },

    #[error("Team {team} is not playing match {match_id}")]
    TeamNotInMatch { team: String, match_id: MatchId },

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Tournament not in correct phase: expected {expected}, got {actual}")]
    InvalidPhase { expected: Phase, actual: Phase },

    #[error("Cannot play a {round:?} match during {phase}")]
    RoundNotActive { round: Round, phase: Phase },

    #[error("Invalid match transition for match {match_id}: {from:?} cannot become {to:?}")]
    InvalidTransition {
        match_id: MatchId,
        from: MatchStatus,
        to: MatchStatus,
    },

    #[error("Match {0} is waiting for earlier results")]
    SlotsUnfilled(MatchId),

    #[error("Invalid tournament format: {0}")]
    InvalidFormat(String),

    #[error("Not enough teams: need {needed}, have {current}")]
    NotEnoughTeams { needed: usize, current: usize },

    #[error("Precondition not met: {0}")]
    Precondition(#[from] PreconditionNotMet),

    #[error("Invalid admin secret")]
    Unauthorized,

    #[error("Admin secret hashing failed")]
    HashingFailed,

    #[error("Admin secret too weak: {0}")]
    WeakSecret(String),

    #[error("Storage error: {0}")]
    Sync(#[from] SyncError),

    #[error("Player statistics error: {0}")]
    Stats(#[from] StatsError),
}

impl TournamentError {
    /// Get a client-safe error message
    ///
    /// Storage errors are reduced to their own sanitized message.
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Sync(e) => e.client_message(),
            TournamentError::Stats(e) => e.client_message(),
            _ => self.to_string(),
        }
    }
}

pub type TournamentResult<T> = Result<T, TournamentError>;
