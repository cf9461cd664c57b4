//! League table computation with a deterministic tie-break cascade.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::tournament::models::{Match, Team, TeamKey};

/// Points for a win
pub const POINTS_WIN: u32 = 3;

/// Points for a draw
pub const POINTS_DRAW: u32 = 1;

/// One line of the league table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsRow {
    pub team_key: TeamKey,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i64,
    pub clean_sheets: u32,
    pub points: u32,
}

impl StandingsRow {
    fn empty(team_key: &str) -> Self {
        Self {
            team_key: team_key.to_string(),
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            goal_difference: 0,
            clean_sheets: 0,
            points: 0,
        }
    }

    fn record(&mut self, scored: u32, conceded: u32) {
        self.played += 1;
        self.goals_for += scored;
        self.goals_against += conceded;
        self.goal_difference = i64::from(self.goals_for) - i64::from(self.goals_against);
        match scored.cmp(&conceded) {
            Ordering::Greater => {
                self.won += 1;
                self.points += POINTS_WIN;
            }
            Ordering::Equal => {
                self.drawn += 1;
                self.points += POINTS_DRAW;
            }
            Ordering::Less => self.lost += 1,
        }
        if conceded == 0 {
            self.clean_sheets += 1;
        }
    }
}

/// A row together with the team's registration index
struct Entry {
    index: usize,
    row: StandingsRow,
}

/// Completed matches with both slots filled, as `(team1, team2, score1, score2)`
fn results(matches: &[Match]) -> impl Iterator<Item = (&str, &str, u32, u32)> {
    matches.iter().filter(|m| m.is_completed()).filter_map(|m| {
        m.teams().map(|(t1, t2)| (t1, t2, m.score1, m.score2))
    })
}

/// Compute the ranked table.
///
/// Only completed matches between registered teams count. Ordering, all
/// descending except the last: points, goal difference, head-to-head among
/// teams still level (mini-league points, then mini-league goal difference),
/// goals for, clean sheets, registration order ascending.
///
/// The result does not depend on the order of `matches`.
pub fn compute_standings(matches: &[Match], teams: &[Team]) -> Vec<StandingsRow> {
    let positions: HashMap<&str, usize> = teams
        .iter()
        .enumerate()
        .map(|(i, t)| (t.key.as_str(), i))
        .collect();

    let mut entries: Vec<Entry> = teams
        .iter()
        .enumerate()
        .map(|(index, t)| Entry {
            index,
            row: StandingsRow::empty(&t.key),
        })
        .collect();

    for (t1, t2, s1, s2) in results(matches) {
        let (Some(&i1), Some(&i2)) = (positions.get(t1), positions.get(t2)) else {
            continue;
        };
        entries[i1].row.record(s1, s2);
        entries[i2].row.record(s2, s1);
    }

    entries.sort_by(|a, b| {
        b.row
            .points
            .cmp(&a.row.points)
            .then_with(|| b.row.goal_difference.cmp(&a.row.goal_difference))
            .then_with(|| a.index.cmp(&b.index))
    });

    let mut start = 0;
    while start < entries.len() {
        let mut end = start + 1;
        while end < entries.len()
            && entries[end].row.points == entries[start].row.points
            && entries[end].row.goal_difference == entries[start].row.goal_difference
        {
            end += 1;
        }
        if end - start > 1 {
            resolve_head_to_head(&mut entries[start..end], matches);
        }
        start = end;
    }

    entries.into_iter().map(|e| e.row).collect()
}

/// Re-order a block of level teams by a mini-league of their mutual matches.
///
/// Residual ties fall to goals for, clean sheets and registration order; the
/// mini-league is not applied again to a smaller subset.
fn resolve_head_to_head(group: &mut [Entry], matches: &[Match]) {
    let mut mini: HashMap<&str, (u32, i64)> = group
        .iter()
        .map(|e| (e.row.team_key.as_str(), (0, 0)))
        .collect();

    for (t1, t2, s1, s2) in results(matches) {
        if !(mini.contains_key(t1) && mini.contains_key(t2)) {
            continue;
        }
        let (p1, p2) = match s1.cmp(&s2) {
            Ordering::Greater => (POINTS_WIN, 0),
            Ordering::Equal => (POINTS_DRAW, POINTS_DRAW),
            Ordering::Less => (0, POINTS_WIN),
        };
        let diff = i64::from(s1) - i64::from(s2);
        if let Some(entry) = mini.get_mut(t1) {
            entry.0 += p1;
            entry.1 += diff;
        }
        if let Some(entry) = mini.get_mut(t2) {
            entry.0 += p2;
            entry.1 -= diff;
        }
    }

    let keys: HashMap<usize, (u32, i64)> = group
        .iter()
        .map(|e| (e.index, mini[e.row.team_key.as_str()]))
        .collect();

    group.sort_by(|a, b| {
        let (a_pts, a_gd) = keys[&a.index];
        let (b_pts, b_gd) = keys[&b.index];
        b_pts
            .cmp(&a_pts)
            .then_with(|| b_gd.cmp(&a_gd))
            .then_with(|| b.row.goals_for.cmp(&a.row.goals_for))
            .then_with(|| b.row.clean_sheets.cmp(&a.row.clean_sheets))
            .then_with(|| a.index.cmp(&b.index))
    });
}

/// 1-based position of a team in the table
pub fn rank_of(rows: &[StandingsRow], team_key: &str) -> Option<usize> {
    rows.iter().position(|r| r.team_key == team_key).map(|i| i + 1)
}

/// The top `n` team keys
pub fn qualifiers(rows: &[StandingsRow], n: usize) -> Vec<TeamKey> {
    rows.iter().take(n).map(|r| r.team_key.clone()).collect()
}
