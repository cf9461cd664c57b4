//! Read model handed to presentation collaborators.

use serde::Serialize;
use std::collections::BTreeMap;

use super::models::{Match, Phase, Team, TeamKey, Tournament, TournamentFormat, TournamentId};
use super::progression::advance;
use crate::standings::{Leaderboard, StandingsRow, compute_leaderboard, compute_standings};
use crate::stats::{PlayerId, PlayerRecord};

/// A tournament with everything derived from it, recomputed on every read.
///
/// The admin secret hash is not part of the view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentView {
    pub id: TournamentId,
    pub phase: Phase,
    pub format: TournamentFormat,
    pub champion: Option<TeamKey>,
    pub teams: Vec<Team>,
    pub group_matches: Vec<Match>,
    pub bracket: Vec<Match>,
    pub standings: Vec<StandingsRow>,
    pub leaderboard: Leaderboard,
    pub players: BTreeMap<PlayerId, PlayerRecord>,
    /// Why the next progression step is not available yet
    pub blocked_by: Option<String>,
}

impl TournamentView {
    pub fn from_tournament(tournament: &Tournament) -> Self {
        let group_matches: Vec<Match> = tournament.group_matches().cloned().collect();
        let standings = compute_standings(&group_matches, &tournament.teams);

        let blocked_by = match tournament.phase {
            Phase::GroupStage | Phase::Knockout => advance(tournament).err().map(|r| r.to_string()),
            Phase::Setup | Phase::Completed => None,
        };

        Self {
            id: tournament.id.clone(),
            phase: tournament.phase,
            format: tournament.format,
            champion: tournament.champion.clone(),
            teams: tournament.teams.clone(),
            bracket: tournament.knockout_matches().cloned().collect(),
            group_matches,
            standings,
            leaderboard: compute_leaderboard(tournament),
            players: tournament.players.clone(),
            blocked_by,
        }
    }
}
