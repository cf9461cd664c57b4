//! Folds match events into lifetime player statistics.
//!
//! Tallying is pure: a completed match (or a whole tournament) becomes one
//! [`StatLine`] per participating player. Applying a tally to a player store
//! goes through [`PlayerRecord::apply`], which refuses a tournament that was
//! already folded into the record.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};

use super::models::{PlayerId, PlayerRecord, StatLine};
use crate::tournament::models::{EventKind, Match, Outcome, Round, Side, Team, Tournament};

/// Player records keyed by ID
pub type PlayerStore = BTreeMap<PlayerId, PlayerRecord>;

/// Per-player tally of a set of matches
pub type Tally = BTreeMap<PlayerId, StatLine>;

/// Players who took part for one side: the roster plus the fielded keeper
fn participants(m: &Match, side: Side, teams: &[Team]) -> BTreeSet<PlayerId> {
    let key = match side {
        Side::Team1 => m.team1_key.as_deref(),
        Side::Team2 => m.team2_key.as_deref(),
    };

    let mut players: BTreeSet<PlayerId> = key
        .and_then(|k| teams.iter().find(|t| t.key == k))
        .map(|t| t.roster.iter().cloned().collect())
        .unwrap_or_default();
    if let Some(keeper) = m.keeper(side) {
        players.insert(keeper.to_string());
    }
    players
}

/// Tally a single completed match. Matches that are not completed, or still
/// have an empty slot, contribute nothing.
pub fn tally_match(m: &Match, teams: &[Team]) -> Tally {
    let mut tally = Tally::new();
    let Some(outcome) = m.outcome() else {
        return tally;
    };

    for side in [Side::Team1, Side::Team2] {
        let (won, conceded) = match side {
            Side::Team1 => (outcome == Outcome::Team1Win, m.score2),
            Side::Team2 => (outcome == Outcome::Team2Win, m.score1),
        };
        let drawn = outcome == Outcome::Draw;

        for player in participants(m, side, teams) {
            let line = tally.entry(player).or_default();
            line.games_played += 1;
            if drawn {
                line.games_drawn += 1;
            } else if won {
                line.games_won += 1;
            } else {
                line.games_lost += 1;
            }

            if m.round == Round::Final {
                line.finals_played += 1;
                if !drawn {
                    if won {
                        line.finals_won += 1;
                    } else {
                        line.finals_lost += 1;
                    }
                }
            }
        }

        if conceded == 0 {
            if let Some(keeper) = m.keeper(side) {
                tally.entry(keeper.to_string()).or_default().clean_sheets += 1;
            }
        }
    }

    for event in &m.events {
        let line = tally.entry(event.player_id.clone()).or_default();
        match event.kind {
            EventKind::Goal => line.goals += 1,
            EventKind::OwnGoal => line.own_goals += 1,
            EventKind::Save => line.saves += 1,
            EventKind::Foul => line.fouls += 1,
            EventKind::YellowCard => line.yellow_cards += 1,
            EventKind::RedCard => line.red_cards += 1,
        }
        if event.kind == EventKind::Goal {
            if let Some(assist) = &event.assist_player_id {
                tally.entry(assist.clone()).or_default().assists += 1;
            }
        }
    }

    tally
}

/// Tally every completed match of a tournament into one line per player
pub fn tally_tournament(tournament: &Tournament) -> Tally {
    let mut total = Tally::new();
    for m in tournament.matches.iter().filter(|m| m.is_completed()) {
        for (player, line) in tally_match(m, &tournament.teams) {
            total.entry(player).or_default().merge(&line);
        }
    }
    total
}

/// Apply a tally to a player store under the per-tournament guard.
///
/// Returns the updated store and the IDs of the players whose records changed.
/// Players missing from the store are skipped with a warning.
pub fn apply_tally(
    tournament_id: &str,
    tally: &Tally,
    mut store: PlayerStore,
    now: DateTime<Utc>,
) -> (PlayerStore, Vec<PlayerId>) {
    let mut applied = Vec::new();
    for (player_id, line) in tally {
        match store.get_mut(player_id) {
            Some(record) => {
                if record.apply(tournament_id, line, now) {
                    applied.push(player_id.clone());
                } else {
                    debug!(
                        "Stats for tournament {} already applied to player {}",
                        tournament_id, player_id
                    );
                }
            }
            None => warn!(
                "Skipping stats for unknown player {} in tournament {}",
                player_id, tournament_id
            ),
        }
    }
    (store, applied)
}

/// Fold one completed match into the store.
///
/// The guard is per tournament, so once any match of a tournament has been
/// applied to a player, later matches of the same tournament are skipped for
/// that player.
pub fn apply_match_stats(
    tournament_id: &str,
    m: &Match,
    teams: &[Team],
    store: PlayerStore,
    now: DateTime<Utc>,
) -> PlayerStore {
    apply_tally(tournament_id, &tally_match(m, teams), store, now).0
}

/// Fold a whole tournament into the store in one pass
pub fn apply_tournament_stats(
    tournament: &Tournament,
    store: PlayerStore,
    now: DateTime<Utc>,
) -> PlayerStore {
    apply_tally(&tournament.id, &tally_tournament(tournament), store, now).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::models::{MatchEvent, MatchStatus};

    fn teams() -> Vec<Team> {
        vec![
            Team::new("red", "Red", "#f00").with_roster(vec!["a".into(), "b".into(), "ka".into()]),
            Team::new("black", "Black", "#000").with_roster(vec!["c".into(), "d".into(), "kb".into()]),
        ]
    }

    fn store(now: DateTime<Utc>) -> PlayerStore {
        ["a", "b", "ka", "c", "d", "kb"]
            .iter()
            .map(|id| (id.to_string(), PlayerRecord::new(id.to_string(), id, now)))
            .collect()
    }

    fn completed(round: Round, events: Vec<MatchEvent>) -> Match {
        let mut m = Match::pending(1, round, Some("red".into()), Some("black".into()), 600);
        m.keeper1_player_id = Some("ka".into());
        m.keeper2_player_id = Some("kb".into());
        m.events = events;
        let (s1, s2) = m.projected_score();
        m.score1 = s1;
        m.score2 = s2;
        m.status = MatchStatus::Completed;
        m
    }

    #[test]
    fn test_tally_counts_results_and_events() {
        let m = completed(
            Round::Group,
            vec![
                MatchEvent::new(EventKind::Goal, "red", "a", 2).with_assist("b"),
                MatchEvent::new(EventKind::Save, "black", "kb", 4),
                MatchEvent::new(EventKind::YellowCard, "black", "c", 6),
            ],
        );
        let tally = tally_match(&m, &teams());

        assert_eq!(tally["a"].goals, 1);
        assert_eq!(tally["b"].assists, 1);
        assert_eq!(tally["kb"].saves, 1);
        assert_eq!(tally["c"].yellow_cards, 1);
        assert_eq!(tally["a"].games_won, 1);
        assert_eq!(tally["d"].games_lost, 1);
        assert_eq!(tally["ka"].clean_sheets, 1);
        assert_eq!(tally["kb"].clean_sheets, 0);
        assert_eq!(tally["a"].finals_played, 0);
    }

    #[test]
    fn test_tally_ignores_unfinished_match() {
        let mut m = completed(Round::Group, vec![]);
        m.status = MatchStatus::Live;
        assert!(tally_match(&m, &teams()).is_empty());
    }

    #[test]
    fn test_draw_gives_both_keepers_clean_sheets() {
        let m = completed(Round::Group, vec![]);
        let tally = tally_match(&m, &teams());
        assert_eq!(tally["ka"].clean_sheets, 1);
        assert_eq!(tally["kb"].clean_sheets, 1);
        assert_eq!(tally["a"].games_drawn, 1);
        assert_eq!(tally["c"].games_drawn, 1);
    }

    #[test]
    fn test_own_goal_breaks_conceding_keeper_clean_sheet() {
        let m = completed(
            Round::Group,
            vec![MatchEvent::new(EventKind::OwnGoal, "red", "b", 3)],
        );
        let tally = tally_match(&m, &teams());
        assert_eq!(tally["b"].own_goals, 1);
        assert_eq!(tally["ka"].clean_sheets, 0);
        assert_eq!(tally["kb"].clean_sheets, 1);
        assert_eq!(tally["c"].games_won, 1);
    }

    #[test]
    fn test_final_counts_finals() {
        let m = completed(
            Round::Final,
            vec![MatchEvent::new(EventKind::Goal, "black", "d", 8)],
        );
        let tally = tally_match(&m, &teams());
        assert_eq!(tally["d"].finals_played, 1);
        assert_eq!(tally["d"].finals_won, 1);
        assert_eq!(tally["a"].finals_lost, 1);
    }

    #[test]
    fn test_apply_match_stats_guard() {
        let now = Utc::now();
        let m = completed(
            Round::Group,
            vec![MatchEvent::new(EventKind::Goal, "red", "a", 2)],
        );

        let once = apply_match_stats("t1", &m, &teams(), store(now), now);
        assert_eq!(once["a"].goals, 1);

        let twice = apply_match_stats("t1", &m, &teams(), once.clone(), now);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_apply_skips_unknown_player() {
        let now = Utc::now();
        let mut tally = Tally::new();
        tally.insert("ghost".to_string(), StatLine { goals: 1, ..StatLine::default() });

        let (store, applied) = apply_tally("t1", &tally, store(now), now);
        assert!(applied.is_empty());
        assert!(!store.contains_key("ghost"));
    }
}
