//! Tournament awards derived from completed matches.

use serde::{Deserialize, Serialize};

use super::calculator::{StandingsRow, compute_standings};
use crate::stats::{PlayerId, StatLine, tally_tournament};
use crate::tournament::models::{Round, TeamKey, Tournament};

/// A player sharing an award
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardedPlayer {
    pub player_id: PlayerId,
    pub name: String,
    pub team_key: Option<TeamKey>,
}

/// A player award with every tied leader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAward {
    pub count: u32,
    pub players: Vec<AwardedPlayer>,
}

/// A team award with every tied leader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamAward {
    pub value: u32,
    pub teams: Vec<TeamKey>,
}

/// All tournament awards. An award is `None` when nobody qualifies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub top_scorers: Option<PlayerAward>,
    pub top_assisters: Option<PlayerAward>,
    pub best_keepers: Option<PlayerAward>,
    pub own_goals: Option<PlayerAward>,
    pub best_attack: Option<TeamAward>,
    pub best_defence: Option<TeamAward>,
    pub most_clean_sheets: Option<TeamAward>,
}

fn player_award(
    tournament: &Tournament,
    tally: &[(PlayerId, StatLine)],
    counter: impl Fn(&StatLine) -> u32,
) -> Option<PlayerAward> {
    let best = tally.iter().map(|(_, line)| counter(line)).max()?;
    if best == 0 {
        return None;
    }

    let players = tally
        .iter()
        .filter(|(_, line)| counter(line) == best)
        .map(|(id, _)| AwardedPlayer {
            player_id: id.clone(),
            name: tournament.player_name(id).to_string(),
            team_key: tournament.team_of_player(id).map(|t| t.key.clone()),
        })
        .collect();

    Some(PlayerAward { count: best, players })
}

fn team_award(rows: &[StandingsRow], value: u32, pick: impl Fn(&StandingsRow) -> u32) -> TeamAward {
    TeamAward {
        value,
        teams: rows
            .iter()
            .filter(|r| pick(r) == value)
            .map(|r| r.team_key.clone())
            .collect(),
    }
}

/// Compute the awards of a tournament.
///
/// Player awards count every completed match; team awards read the group
/// table. Best defence only considers teams that played.
pub fn compute_leaderboard(tournament: &Tournament) -> Leaderboard {
    let tally: Vec<(PlayerId, StatLine)> = tally_tournament(tournament).into_iter().collect();

    let group: Vec<_> = tournament
        .matches
        .iter()
        .filter(|m| m.round == Round::Group)
        .cloned()
        .collect();
    let rows: Vec<StandingsRow> = compute_standings(&group, &tournament.teams)
        .into_iter()
        .filter(|r| r.played > 0)
        .collect();

    let best_attack = rows
        .iter()
        .map(|r| r.goals_for)
        .max()
        .filter(|v| *v > 0)
        .map(|v| team_award(&rows, v, |r| r.goals_for));
    let best_defence = rows
        .iter()
        .map(|r| r.goals_against)
        .min()
        .map(|v| team_award(&rows, v, |r| r.goals_against));
    let most_clean_sheets = rows
        .iter()
        .map(|r| r.clean_sheets)
        .max()
        .filter(|v| *v > 0)
        .map(|v| team_award(&rows, v, |r| r.clean_sheets));

    Leaderboard {
        top_scorers: player_award(tournament, &tally, |l| l.goals),
        top_assisters: player_award(tournament, &tally, |l| l.assists),
        best_keepers: player_award(tournament, &tally, |l| l.saves),
        own_goals: player_award(tournament, &tally, |l| l.own_goals),
        best_attack,
        best_defence,
        most_clean_sheets,
    }
}
