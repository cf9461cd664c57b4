//! Tournament data models: teams, matches, events and the tournament document.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::stats::{PlayerId, PlayerRecord};

/// Tournament ID type
pub type TournamentId = String;

/// Team key type (e.g. `"red"`)
pub type TeamKey = String;

/// Match ID type, unique within a tournament
pub type MatchId = u32;

/// Default match length in seconds (10 minutes)
pub const DEFAULT_MATCH_DURATION_SECS: u32 = 600;

/// Top-level tournament lifecycle stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Rosters are being assembled
    Setup,
    /// Round-robin fixtures are being played
    GroupStage,
    /// Bracket matches are being played
    Knockout,
    /// The final has been decided
    Completed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Setup => write!(f, "setup"),
            Phase::GroupStage => write!(f, "groupStage"),
            Phase::Knockout => write!(f, "knockout"),
            Phase::Completed => write!(f, "completed"),
        }
    }
}

/// Round a match belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Round {
    Group,
    Semifinal,
    Final,
    ThirdPlace,
}

impl Round {
    /// Whether the round is part of the knockout bracket
    pub fn is_knockout(self) -> bool {
        !matches!(self, Round::Group)
    }
}

/// Match status. Only ever advances `Pending -> Live -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchStatus {
    Pending,
    Live,
    Completed,
}

impl MatchStatus {
    /// The only status this one may move to
    pub fn successor(self) -> Option<MatchStatus> {
        match self {
            MatchStatus::Pending => Some(MatchStatus::Live),
            MatchStatus::Live => Some(MatchStatus::Completed),
            MatchStatus::Completed => None,
        }
    }
}

/// Kind of a live match event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Goal,
    OwnGoal,
    Save,
    Foul,
    YellowCard,
    RedCard,
}

/// A single live score event. Append-only once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchEvent {
    /// What happened
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Team of the player involved (for own goals: the conceding player's team)
    pub team_key: TeamKey,
    /// Player involved
    pub player_id: PlayerId,
    /// Match minute, advisory only
    pub minute: u32,
    /// Assisting player, goals only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assist_player_id: Option<PlayerId>,
}

impl MatchEvent {
    /// Create an event without an assist
    pub fn new(kind: EventKind, team_key: &str, player_id: &str, minute: u32) -> Self {
        Self {
            kind,
            team_key: team_key.to_string(),
            player_id: player_id.to_string(),
            minute,
            assist_player_id: None,
        }
    }

    /// Attach an assisting player
    pub fn with_assist(mut self, player_id: &str) -> Self {
        self.assist_player_id = Some(player_id.to_string());
        self
    }
}

/// A registered team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub key: TeamKey,
    pub display_name: String,
    pub color_token: String,
    /// Player IDs in registration order
    #[serde(default)]
    pub roster: Vec<PlayerId>,
}

impl Team {
    pub fn new(key: &str, display_name: &str, color_token: &str) -> Self {
        Self {
            key: key.to_string(),
            display_name: display_name.to_string(),
            color_token: color_token.to_string(),
            roster: Vec::new(),
        }
    }

    pub fn with_roster(mut self, roster: Vec<PlayerId>) -> Self {
        self.roster = roster;
        self
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.roster.iter().any(|p| p == player_id)
    }
}

/// Result of a completed match from the first team's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Team1Win,
    Team2Win,
    Draw,
}

/// Side of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Team1,
    Team2,
}

/// A fixture between two teams
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub round: Round,
    /// `None` while the bracket slot waits for an earlier result
    pub team1_key: Option<TeamKey>,
    pub team2_key: Option<TeamKey>,
    /// Cached projection of the events
    pub score1: u32,
    pub score2: u32,
    pub status: MatchStatus,
    #[serde(default)]
    pub events: Vec<MatchEvent>,
    pub keeper1_player_id: Option<PlayerId>,
    pub keeper2_player_id: Option<PlayerId>,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_seconds: u32,
}

impl Match {
    /// Create a pending fixture
    pub fn pending(
        id: MatchId,
        round: Round,
        team1_key: Option<TeamKey>,
        team2_key: Option<TeamKey>,
        duration_seconds: u32,
    ) -> Self {
        Self {
            id,
            round,
            team1_key,
            team2_key,
            score1: 0,
            score2: 0,
            status: MatchStatus::Pending,
            events: Vec::new(),
            keeper1_player_id: None,
            keeper2_player_id: None,
            started_at: None,
            duration_seconds,
        }
    }

    /// Both team keys, once both slots are filled
    pub fn teams(&self) -> Option<(&str, &str)> {
        match (&self.team1_key, &self.team2_key) {
            (Some(t1), Some(t2)) => Some((t1.as_str(), t2.as_str())),
            _ => None,
        }
    }

    pub fn involves(&self, team_key: &str) -> bool {
        self.side_of(team_key).is_some()
    }

    pub fn side_of(&self, team_key: &str) -> Option<Side> {
        if self.team1_key.as_deref() == Some(team_key) {
            Some(Side::Team1)
        } else if self.team2_key.as_deref() == Some(team_key) {
            Some(Side::Team2)
        } else {
            None
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// Recompute `(score1, score2)` from the events.
    ///
    /// A goal counts for the scorer's team, an own goal for the other side.
    pub fn projected_score(&self) -> (u32, u32) {
        self.events
            .iter()
            .fold((0, 0), |(s1, s2), event| match (event.kind, self.side_of(&event.team_key)) {
                (EventKind::Goal, Some(Side::Team1)) | (EventKind::OwnGoal, Some(Side::Team2)) => {
                    (s1 + 1, s2)
                }
                (EventKind::Goal, Some(Side::Team2)) | (EventKind::OwnGoal, Some(Side::Team1)) => {
                    (s1, s2 + 1)
                }
                _ => (s1, s2),
            })
    }

    /// Outcome of a completed match with both teams known
    pub fn outcome(&self) -> Option<Outcome> {
        if !self.is_completed() || self.teams().is_none() {
            return None;
        }
        Some(match self.score1.cmp(&self.score2) {
            std::cmp::Ordering::Greater => Outcome::Team1Win,
            std::cmp::Ordering::Less => Outcome::Team2Win,
            std::cmp::Ordering::Equal => Outcome::Draw,
        })
    }

    /// Winning team of a completed, decided match
    pub fn winner(&self) -> Option<&str> {
        match self.outcome()? {
            Outcome::Team1Win => self.team1_key.as_deref(),
            Outcome::Team2Win => self.team2_key.as_deref(),
            Outcome::Draw => None,
        }
    }

    /// Losing team of a completed, decided match
    pub fn loser(&self) -> Option<&str> {
        match self.outcome()? {
            Outcome::Team1Win => self.team2_key.as_deref(),
            Outcome::Team2Win => self.team1_key.as_deref(),
            Outcome::Draw => None,
        }
    }

    /// Keeper fielded by the given side
    pub fn keeper(&self, side: Side) -> Option<&str> {
        match side {
            Side::Team1 => self.keeper1_player_id.as_deref(),
            Side::Team2 => self.keeper2_player_id.as_deref(),
        }
    }
}

/// Knockout format, stored with the tournament so every device progresses it the same way
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentFormat {
    /// Teams that qualify from the group stage (2 or 4)
    pub knockout_qualifiers: usize,
    /// Play a third-place match between the semifinal losers
    pub third_place_match: bool,
    /// Length of each match in seconds
    pub match_duration_secs: u32,
}

impl Default for TournamentFormat {
    fn default() -> Self {
        Self {
            knockout_qualifiers: 2,
            third_place_match: false,
            match_duration_secs: DEFAULT_MATCH_DURATION_SECS,
        }
    }
}

/// The tournament document, written and read wholesale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: TournamentId,
    pub created_at: DateTime<Utc>,
    pub admin_secret_hash: String,
    pub phase: Phase,
    #[serde(default)]
    pub format: TournamentFormat,
    /// Teams in registration order
    pub teams: Vec<Team>,
    pub matches: Vec<Match>,
    #[serde(default)]
    pub players: BTreeMap<PlayerId, PlayerRecord>,
    #[serde(default)]
    pub champion: Option<TeamKey>,
}

impl Tournament {
    /// Create a tournament in the setup phase with no matches
    pub fn new(
        id: TournamentId,
        admin_secret_hash: String,
        format: TournamentFormat,
        teams: Vec<Team>,
        players: BTreeMap<PlayerId, PlayerRecord>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            created_at,
            admin_secret_hash,
            phase: Phase::Setup,
            format,
            teams,
            matches: Vec::new(),
            players,
            champion: None,
        }
    }

    pub fn team(&self, key: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.key == key)
    }

    pub fn match_by_id(&self, id: MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == id)
    }

    pub fn group_matches(&self) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(|m| m.round == Round::Group)
    }

    pub fn knockout_matches(&self) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(|m| m.round.is_knockout())
    }

    pub fn final_match(&self) -> Option<&Match> {
        self.matches.iter().find(|m| m.round == Round::Final)
    }

    /// Team whose roster lists the player
    pub fn team_of_player(&self, player_id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.has_player(player_id))
    }

    /// Display name for a player, falling back to the ID
    pub fn player_name<'a>(&'a self, player_id: &'a str) -> &'a str {
        self.players
            .get(player_id)
            .map(|p| p.name.as_str())
            .unwrap_or(player_id)
    }

    /// Next free match ID
    pub fn next_match_id(&self) -> MatchId {
        self.matches.iter().map(|m| m.id).max().map_or(1, |id| id + 1)
    }
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Random lowercase base-36 suffix
pub(crate) fn random_suffix(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Generate a tournament ID of the form `tournament_<unix millis>_<9 base-36 chars>`
pub fn generate_tournament_id(now: DateTime<Utc>) -> TournamentId {
    format!("tournament_{}_{}", now.timestamp_millis(), random_suffix(9))
}
