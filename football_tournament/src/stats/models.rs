//! Lifetime player statistics records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::tournament::models::{TournamentId, random_suffix};

/// Player ID type (`{normalized-name}_{suffix}`)
pub type PlayerId = String;

/// Lifetime statistics for a single player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub name: String,
    pub games_played: u32,
    pub games_won: u32,
    pub games_lost: u32,
    pub games_drawn: u32,
    pub goals: u32,
    pub assists: u32,
    pub saves: u32,
    pub clean_sheets: u32,
    pub own_goals: u32,
    #[serde(default)]
    pub fouls: u32,
    #[serde(default)]
    pub yellow_cards: u32,
    #[serde(default)]
    pub red_cards: u32,
    pub finals_played: u32,
    pub finals_won: u32,
    pub finals_lost: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_played: Option<DateTime<Utc>>,
    /// Tournaments already folded into this record
    #[serde(default)]
    pub tournament_ids_applied: BTreeSet<TournamentId>,
}

impl PlayerRecord {
    /// Create an empty record
    pub fn new(id: PlayerId, name: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.to_string(),
            games_played: 0,
            games_won: 0,
            games_lost: 0,
            games_drawn: 0,
            goals: 0,
            assists: 0,
            saves: 0,
            clean_sheets: 0,
            own_goals: 0,
            fouls: 0,
            yellow_cards: 0,
            red_cards: 0,
            finals_played: 0,
            finals_won: 0,
            finals_lost: 0,
            created_at,
            last_played: None,
            tournament_ids_applied: BTreeSet::new(),
        }
    }

    /// Whether the tournament has already been folded into this record
    pub fn has_applied(&self, tournament_id: &str) -> bool {
        self.tournament_ids_applied.contains(tournament_id)
    }

    /// Add a stat line under the per-tournament guard.
    ///
    /// Returns `false` without touching any counter when the tournament was
    /// already applied.
    pub fn apply(&mut self, tournament_id: &str, line: &StatLine, now: DateTime<Utc>) -> bool {
        if self.has_applied(tournament_id) {
            return false;
        }

        self.games_played += line.games_played;
        self.games_won += line.games_won;
        self.games_lost += line.games_lost;
        self.games_drawn += line.games_drawn;
        self.goals += line.goals;
        self.assists += line.assists;
        self.saves += line.saves;
        self.clean_sheets += line.clean_sheets;
        self.own_goals += line.own_goals;
        self.fouls += line.fouls;
        self.yellow_cards += line.yellow_cards;
        self.red_cards += line.red_cards;
        self.finals_played += line.finals_played;
        self.finals_won += line.finals_won;
        self.finals_lost += line.finals_lost;
        if line.games_played > 0 {
            self.last_played = Some(now);
        }
        self.tournament_ids_applied.insert(tournament_id.to_string());
        true
    }
}

/// Counters accumulated for one player over some set of matches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatLine {
    pub games_played: u32,
    pub games_won: u32,
    pub games_lost: u32,
    pub games_drawn: u32,
    pub goals: u32,
    pub assists: u32,
    pub saves: u32,
    pub clean_sheets: u32,
    pub own_goals: u32,
    pub fouls: u32,
    pub yellow_cards: u32,
    pub red_cards: u32,
    pub finals_played: u32,
    pub finals_won: u32,
    pub finals_lost: u32,
}

impl StatLine {
    /// Sum two lines
    pub fn merge(&mut self, other: &StatLine) {
        self.games_played += other.games_played;
        self.games_won += other.games_won;
        self.games_lost += other.games_lost;
        self.games_drawn += other.games_drawn;
        self.goals += other.goals;
        self.assists += other.assists;
        self.saves += other.saves;
        self.clean_sheets += other.clean_sheets;
        self.own_goals += other.own_goals;
        self.fouls += other.fouls;
        self.yellow_cards += other.yellow_cards;
        self.red_cards += other.red_cards;
        self.finals_played += other.finals_played;
        self.finals_won += other.finals_won;
        self.finals_lost += other.finals_lost;
    }

    pub fn is_empty(&self) -> bool {
        *self == StatLine::default()
    }
}

/// Normalize a display name for ID generation: lowercase, whitespace runs become `_`
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Generate a player ID from a display name
pub fn generate_player_id(name: &str) -> PlayerId {
    format!("{}_{}", normalize_name(name), random_suffix(5))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(goals: u32) -> StatLine {
        StatLine {
            games_played: 1,
            games_won: 1,
            goals,
            ..StatLine::default()
        }
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Ali  Reza"), "ali_reza");
        assert_eq!(normalize_name("  Sam\tK "), "sam_k");
        assert_eq!(normalize_name("Bob"), "bob");
    }

    #[test]
    fn test_generate_player_id() {
        let id = generate_player_id("Mo Salah");
        assert!(id.starts_with("mo_salah_"));
        assert_eq!(id.len(), "mo_salah_".len() + 5);
    }

    #[test]
    fn test_apply_is_additive() {
        let now = Utc::now();
        let mut record = PlayerRecord::new("bob_abcde".to_string(), "Bob", now);
        record.goals = 4;

        assert!(record.apply("t1", &line(2), now));
        assert_eq!(record.goals, 6);
        assert_eq!(record.games_played, 1);
        assert_eq!(record.last_played, Some(now));
        assert!(record.has_applied("t1"));
    }

    #[test]
    fn test_apply_guard_skips_repeat() {
        let now = Utc::now();
        let mut record = PlayerRecord::new("bob_abcde".to_string(), "Bob", now);

        assert!(record.apply("t1", &line(2), now));
        let snapshot = record.clone();
        assert!(!record.apply("t1", &line(5), now));
        assert_eq!(record, snapshot);
    }

    #[test]
    fn test_stat_line_merge() {
        let mut total = line(1);
        total.merge(&line(2));
        assert_eq!(total.goals, 3);
        assert_eq!(total.games_played, 2);
        assert!(!total.is_empty());
        assert!(StatLine::default().is_empty());
    }
}
