//! Lifetime statistics tests.
//!
//! A tournament is counted at most once per player, and counters only ever
//! grow by the tallied amounts.

use chrono::Utc;
use football_tournament::stats::{
    MemoryPlayerRepository, PlayerRecord, PlayerRepository, PlayerStore, StatLine, StatsError,
    apply_match_stats, apply_tournament_stats, tally_tournament,
};
use football_tournament::tournament::{
    EventKind, MatchEvent, MatchStatus, Round, Team, Tournament, TournamentFormat, advance,
    begin_group_stage, complete_match, record_event, start_match,
};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn counters(record: &PlayerRecord) -> StatLine {
    StatLine {
        games_played: record.games_played,
        games_won: record.games_won,
        games_lost: record.games_lost,
        games_drawn: record.games_drawn,
        goals: record.goals,
        assists: record.assists,
        saves: record.saves,
        clean_sheets: record.clean_sheets,
        own_goals: record.own_goals,
        fouls: record.fouls,
        yellow_cards: record.yellow_cards,
        red_cards: record.red_cards,
        finals_played: record.finals_played,
        finals_won: record.finals_won,
        finals_lost: record.finals_lost,
    }
}

fn line_from(v: [u32; 15]) -> StatLine {
    StatLine {
        games_played: v[0],
        games_won: v[1],
        games_lost: v[2],
        games_drawn: v[3],
        goals: v[4],
        assists: v[5],
        saves: v[6],
        clean_sheets: v[7],
        own_goals: v[8],
        fouls: v[9],
        yellow_cards: v[10],
        red_cards: v[11],
        finals_played: v[12],
        finals_won: v[13],
        finals_lost: v[14],
    }
}

fn store(ids: &[&str]) -> PlayerStore {
    ids.iter()
        .map(|id| (id.to_string(), PlayerRecord::new(id.to_string(), id, Utc::now())))
        .collect()
}

/// Two-team tournament played to completion: red wins the group match 1-0 and the final 2-1
fn completed_tournament() -> Tournament {
    let teams = vec![
        Team::new("red", "Red", "#f00").with_roster(vec!["ali".into(), "rk".into()]),
        Team::new("black", "Black", "#000").with_roster(vec!["kim".into(), "bk".into()]),
    ];
    let t = Tournament::new(
        "tournament_1_stats".into(),
        String::new(),
        TournamentFormat::default(),
        teams,
        store(&["ali", "rk", "kim", "bk"]),
        Utc::now(),
    );
    let now = Utc::now();

    let t = begin_group_stage(&t).unwrap();
    let t = start_match(&t, 1, Some("rk"), Some("bk"), now).unwrap();
    let t = record_event(&t, 1, MatchEvent::new(EventKind::Goal, "red", "ali", 4)).unwrap();
    let t = record_event(&t, 1, MatchEvent::new(EventKind::Save, "black", "bk", 6)).unwrap();
    let t = complete_match(&t, 1).unwrap();

    let t = advance(&t).unwrap();
    let t = start_match(&t, 2, Some("rk"), Some("bk"), now).unwrap();
    let t = [
        MatchEvent::new(EventKind::Goal, "red", "ali", 2).with_assist("rk"),
        MatchEvent::new(EventKind::OwnGoal, "red", "ali", 5),
        MatchEvent::new(EventKind::Goal, "red", "rk", 8),
        MatchEvent::new(EventKind::YellowCard, "black", "kim", 9),
    ]
    .into_iter()
    .fold(t, |t, e| record_event(&t, 2, e).unwrap());
    let t = complete_match(&t, 2).unwrap();
    advance(&t).unwrap()
}

#[test]
fn test_reapplied_tournament_changes_nothing() {
    let t = completed_tournament();
    let group = t.match_by_id(1).unwrap();
    let mut players = store(&["ali", "rk", "kim", "bk"]);
    for record in players.values_mut() {
        record.tournament_ids_applied.insert(t.id.clone());
    }
    let before = players.clone();

    let after = apply_match_stats(&t.id, group, &t.teams, players, Utc::now());
    assert_eq!(after, before);
}

#[test]
fn test_tournament_fold() {
    let t = completed_tournament();
    assert_eq!(t.champion.as_deref(), Some("red"));

    let players = apply_tournament_stats(&t, store(&["ali", "rk", "kim", "bk"]), Utc::now());

    let ali = &players["ali"];
    assert_eq!(ali.games_played, 2);
    assert_eq!(ali.games_won, 2);
    assert_eq!(ali.goals, 2);
    assert_eq!(ali.own_goals, 1);
    assert_eq!(ali.finals_played, 1);
    assert_eq!(ali.finals_won, 1);
    assert!(ali.last_played.is_some());
    assert!(ali.has_applied(&t.id));

    let rk = &players["rk"];
    assert_eq!(rk.assists, 1);
    assert_eq!(rk.goals, 1);
    assert_eq!(rk.clean_sheets, 1, "Only the group match kept a clean sheet");

    let kim = &players["kim"];
    assert_eq!(kim.games_lost, 2);
    assert_eq!(kim.finals_lost, 1);
    assert_eq!(kim.yellow_cards, 1);

    let bk = &players["bk"];
    assert_eq!(bk.saves, 1);
    assert_eq!(bk.clean_sheets, 0);

    // A second fold of the same tournament is a no-op
    let again = apply_tournament_stats(&t, players.clone(), Utc::now());
    assert_eq!(again, players);
}

#[test]
fn test_incomplete_matches_not_tallied() {
    let mut t = completed_tournament();
    let final_match = t.matches.iter_mut().find(|m| m.round == Round::Final).unwrap();
    final_match.status = MatchStatus::Live;

    let tally = tally_tournament(&t);
    assert_eq!(tally["ali"].games_played, 1);
    assert_eq!(tally["ali"].finals_played, 0);
}

#[tokio::test]
async fn test_repository_guard() {
    let repo = MemoryPlayerRepository::new();
    let sam = repo.get_or_create("Sam").await.unwrap();
    let line = StatLine {
        games_played: 3,
        goals: 4,
        ..StatLine::default()
    };

    assert!(repo.apply_stat_line(&sam.id, "t1", &line).await.unwrap());
    assert!(!repo.apply_stat_line(&sam.id, "t1", &line).await.unwrap());
    assert!(repo.apply_stat_line(&sam.id, "t2", &line).await.unwrap());

    let sam = repo.get(&sam.id).await.unwrap();
    assert_eq!(sam.goals, 8);
    assert_eq!(sam.games_played, 6);
    assert_eq!(sam.tournament_ids_applied.len(), 2);

    assert!(matches!(
        repo.apply_stat_line("nobody_00000", "t1", &line).await,
        Err(StatsError::PlayerNotFound(_))
    ));
}

proptest! {
    #[test]
    fn test_apply_is_additive(
        a in prop::array::uniform15(0u32..1000),
        b in prop::array::uniform15(0u32..1000),
    ) {
        let (a, b) = (line_from(a), line_from(b));
        let mut record = PlayerRecord::new("p".to_string(), "P", Utc::now());

        prop_assert!(record.apply("t1", &a, Utc::now()));
        prop_assert!(record.apply("t2", &b, Utc::now()));
        prop_assert!(!record.apply("t1", &b, Utc::now()));

        let mut expected = a;
        expected.merge(&b);
        prop_assert_eq!(counters(&record), expected);
    }

    #[test]
    fn test_guard_blocks_any_line(a in prop::array::uniform15(0u32..1000)) {
        let mut record = PlayerRecord::new("p".to_string(), "P", Utc::now());
        record.tournament_ids_applied.insert("t1".to_string());
        let before = record.clone();

        prop_assert!(!record.apply("t1", &line_from(a), Utc::now()));
        prop_assert_eq!(record, before);
    }
}

#[test]
fn test_unknown_players_skipped() {
    let t = completed_tournament();
    let partial: BTreeMap<_, _> = store(&["ali"]);
    let players = apply_tournament_stats(&t, partial, Utc::now());

    assert_eq!(players.len(), 1);
    assert_eq!(players["ali"].goals, 2);
}
