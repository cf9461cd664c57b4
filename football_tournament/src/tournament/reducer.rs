//! Pure match reducers.
//!
//! Each reducer validates against a snapshot and returns a new snapshot. The
//! input is never modified, so a rejected mutation leaves nothing to undo.

use chrono::{DateTime, Utc};

use super::errors::{TournamentError, TournamentResult};
use super::models::{
    EventKind, Match, MatchEvent, MatchId, MatchStatus, Phase, Side, Tournament,
};

fn find_match(tournament: &Tournament, match_id: MatchId) -> TournamentResult<usize> {
    tournament
        .matches
        .iter()
        .position(|m| m.id == match_id)
        .ok_or(TournamentError::MatchNotFound(match_id))
}

fn check_transition(m: &Match, to: MatchStatus) -> TournamentResult<()> {
    if m.status.successor() == Some(to) {
        Ok(())
    } else {
        Err(TournamentError::InvalidTransition {
            match_id: m.id,
            from: m.status,
            to,
        })
    }
}

/// Whether the player plays for the given side of the match
fn plays_for(tournament: &Tournament, m: &Match, side: Side, player_id: &str) -> bool {
    if m.keeper(side) == Some(player_id) {
        return true;
    }
    let key = match side {
        Side::Team1 => m.team1_key.as_deref(),
        Side::Team2 => m.team2_key.as_deref(),
    };
    key.and_then(|k| tournament.team(k))
        .map(|t| t.has_player(player_id))
        .unwrap_or(false)
}

/// Kick off a pending match with its keepers.
pub fn start_match(
    tournament: &Tournament,
    match_id: MatchId,
    keeper1: Option<&str>,
    keeper2: Option<&str>,
    now: DateTime<Utc>,
) -> TournamentResult<Tournament> {
    let index = find_match(tournament, match_id)?;
    let m = &tournament.matches[index];

    let active = match tournament.phase {
        Phase::GroupStage => !m.round.is_knockout(),
        Phase::Knockout => m.round.is_knockout(),
        Phase::Setup | Phase::Completed => false,
    };
    if !active {
        return Err(TournamentError::RoundNotActive {
            round: m.round,
            phase: tournament.phase,
        });
    }
    check_transition(m, MatchStatus::Live)?;
    let Some((team1, team2)) = m.teams() else {
        return Err(TournamentError::SlotsUnfilled(match_id));
    };

    for (keeper, team_key) in [(keeper1, team1), (keeper2, team2)] {
        if let Some(keeper) = keeper {
            let team = tournament
                .team(team_key)
                .ok_or_else(|| TournamentError::UnknownTeam(team_key.to_string()))?;
            if !team.has_player(keeper) {
                return Err(TournamentError::PlayerNotOnTeam {
                    player: keeper.to_string(),
                    team: team_key.to_string(),
                });
            }
        }
    }

    let mut next = tournament.clone();
    let m = &mut next.matches[index];
    m.status = MatchStatus::Live;
    m.started_at = Some(now);
    m.keeper1_player_id = keeper1.map(str::to_string);
    m.keeper2_player_id = keeper2.map(str::to_string);
    Ok(next)
}

/// Append an event to a live match and re-project its score.
pub fn record_event(
    tournament: &Tournament,
    match_id: MatchId,
    event: MatchEvent,
) -> TournamentResult<Tournament> {
    let index = find_match(tournament, match_id)?;
    let m = &tournament.matches[index];

    if m.status != MatchStatus::Live {
        return Err(TournamentError::InvalidEvent(format!(
            "match {} is {:?}, events need a live match",
            match_id, m.status
        )));
    }
    let side = m
        .side_of(&event.team_key)
        .ok_or_else(|| TournamentError::TeamNotInMatch {
            team: event.team_key.clone(),
            match_id,
        })?;
    if !plays_for(tournament, m, side, &event.player_id) {
        return Err(TournamentError::PlayerNotOnTeam {
            player: event.player_id.clone(),
            team: event.team_key.clone(),
        });
    }

    if let Some(assist) = &event.assist_player_id {
        if event.kind != EventKind::Goal {
            return Err(TournamentError::InvalidEvent(
                "only goals can carry an assist".to_string(),
            ));
        }
        if *assist == event.player_id {
            return Err(TournamentError::InvalidEvent(
                "a player cannot assist their own goal".to_string(),
            ));
        }
        if !plays_for(tournament, m, side, assist) {
            return Err(TournamentError::PlayerNotOnTeam {
                player: assist.clone(),
                team: event.team_key.clone(),
            });
        }
    }

    let mut next = tournament.clone();
    let m = &mut next.matches[index];
    m.events.push(event);
    (m.score1, m.score2) = m.projected_score();
    Ok(next)
}

/// Final whistle: `live -> completed`.
pub fn complete_match(tournament: &Tournament, match_id: MatchId) -> TournamentResult<Tournament> {
    let index = find_match(tournament, match_id)?;
    check_transition(&tournament.matches[index], MatchStatus::Completed)?;

    let mut next = tournament.clone();
    let m = &mut next.matches[index];
    m.status = MatchStatus::Completed;
    (m.score1, m.score2) = m.projected_score();
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::models::{Round, Team, TournamentFormat};
    use crate::tournament::progression::begin_group_stage;
    use std::collections::BTreeMap;

    fn group_stage() -> Tournament {
        let teams = vec![
            Team::new("red", "Red", "#f00").with_roster(vec!["r1".into(), "r2".into()]),
            Team::new("black", "Black", "#000").with_roster(vec!["b1".into(), "b2".into()]),
            Team::new("white", "White", "#fff").with_roster(vec!["w1".into()]),
        ];
        let t = Tournament::new(
            "t".into(),
            String::new(),
            TournamentFormat::default(),
            teams,
            BTreeMap::new(),
            Utc::now(),
        );
        begin_group_stage(&t).unwrap()
    }

    #[test]
    fn test_start_match() {
        let t = group_stage();
        let now = Utc::now();
        let live = start_match(&t, 1, Some("r2"), Some("b2"), now).unwrap();

        let m = live.match_by_id(1).unwrap();
        assert_eq!(m.status, MatchStatus::Live);
        assert_eq!(m.started_at, Some(now));
        assert_eq!(m.keeper1_player_id.as_deref(), Some("r2"));
        assert_eq!(t.match_by_id(1).unwrap().status, MatchStatus::Pending, "Input untouched");
    }

    #[test]
    fn test_start_rejects_foreign_keeper() {
        let t = group_stage();
        let result = start_match(&t, 1, Some("b1"), None, Utc::now());
        assert!(matches!(result, Err(TournamentError::PlayerNotOnTeam { .. })));
    }

    #[test]
    fn test_start_twice_is_invalid_transition() {
        let t = start_match(&group_stage(), 1, None, None, Utc::now()).unwrap();
        let result = start_match(&t, 1, None, None, Utc::now());
        assert!(matches!(
            result,
            Err(TournamentError::InvalidTransition {
                from: MatchStatus::Live,
                to: MatchStatus::Live,
                ..
            })
        ));
    }

    #[test]
    fn test_start_in_setup_rejected() {
        let mut t = group_stage();
        t.phase = Phase::Setup;
        let result = start_match(&t, 1, None, None, Utc::now());
        assert!(matches!(
            result,
            Err(TournamentError::RoundNotActive { round: Round::Group, .. })
        ));
    }

    #[test]
    fn test_record_event_projects_score() {
        let t = start_match(&group_stage(), 1, None, Some("b2"), Utc::now()).unwrap();
        let t = record_event(&t, 1, MatchEvent::new(EventKind::Goal, "red", "r1", 2).with_assist("r2"))
            .unwrap();
        let t = record_event(&t, 1, MatchEvent::new(EventKind::OwnGoal, "black", "b1", 5)).unwrap();
        let t = record_event(&t, 1, MatchEvent::new(EventKind::Save, "black", "b2", 7)).unwrap();

        let m = t.match_by_id(1).unwrap();
        assert_eq!((m.score1, m.score2), (2, 0));
        assert_eq!(m.events.len(), 3);
    }

    #[test]
    fn test_record_event_rejects_outsiders() {
        let t = start_match(&group_stage(), 1, None, None, Utc::now()).unwrap();

        let wrong_team = record_event(&t, 1, MatchEvent::new(EventKind::Goal, "white", "w1", 1));
        assert!(matches!(wrong_team, Err(TournamentError::TeamNotInMatch { .. })));

        let wrong_player = record_event(&t, 1, MatchEvent::new(EventKind::Goal, "red", "b1", 1));
        assert!(matches!(wrong_player, Err(TournamentError::PlayerNotOnTeam { .. })));

        let bad_assist = record_event(
            &t,
            1,
            MatchEvent::new(EventKind::Foul, "red", "r1", 1).with_assist("r2"),
        );
        assert!(matches!(bad_assist, Err(TournamentError::InvalidEvent(_))));
    }

    #[test]
    fn test_record_event_requires_live() {
        let t = group_stage();
        let result = record_event(&t, 1, MatchEvent::new(EventKind::Goal, "red", "r1", 1));
        assert!(matches!(result, Err(TournamentError::InvalidEvent(_))));
    }

    #[test]
    fn test_complete_match_forward_only() {
        let t = group_stage();
        assert!(matches!(
            complete_match(&t, 1),
            Err(TournamentError::InvalidTransition { .. })
        ));

        let t = start_match(&t, 1, None, None, Utc::now()).unwrap();
        let t = complete_match(&t, 1).unwrap();
        assert!(t.match_by_id(1).unwrap().is_completed());
        assert!(matches!(
            complete_match(&t, 1),
            Err(TournamentError::InvalidTransition { .. })
        ));
        assert!(matches!(complete_match(&t, 99), Err(TournamentError::MatchNotFound(99))));
    }
}
