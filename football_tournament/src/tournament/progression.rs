//! Round progression: `setup -> groupStage -> knockout -> completed`.
//!
//! Both entry points take a snapshot and return a new one. When a
//! precondition does not hold they return a [`PreconditionNotMet`] report and
//! the caller keeps its snapshot unchanged.

use log::debug;
use thiserror::Error;

use super::models::{Match, MatchId, Phase, Round, TeamKey, Tournament};
use crate::standings::{compute_standings, qualifiers};

/// Why a phase transition did not happen
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionNotMet {
    #[error("Tournament is in {actual}, expected {expected}")]
    WrongPhase { expected: Phase, actual: Phase },

    #[error("Tournament is already completed")]
    AlreadyCompleted,

    #[error("Not enough teams: need {needed}, have {current}")]
    NotEnoughTeams { needed: usize, current: usize },

    #[error("{remaining} group matches still to be completed")]
    GroupMatchesOutstanding { remaining: usize },

    #[error("{remaining} knockout matches still to be completed")]
    KnockoutMatchesOutstanding { remaining: usize },

    #[error("Knockout match {match_id} ended in a draw and has no winner")]
    UnresolvedKnockoutDraw { match_id: MatchId },

    #[error("Unsupported number of knockout qualifiers: {0}")]
    UnsupportedQualifiers(usize),
}

/// Generate the round-robin fixtures and move `setup -> groupStage`.
///
/// Every pair of teams meets once, ordered by registration (`0v1, 0v2, .., 1v2, ..`).
pub fn begin_group_stage(tournament: &Tournament) -> Result<Tournament, PreconditionNotMet> {
    if tournament.phase != Phase::Setup {
        return Err(PreconditionNotMet::WrongPhase {
            expected: Phase::Setup,
            actual: tournament.phase,
        });
    }

    let needed = tournament.format.knockout_qualifiers.max(2);
    if tournament.teams.len() < needed {
        return Err(PreconditionNotMet::NotEnoughTeams {
            needed,
            current: tournament.teams.len(),
        });
    }

    let mut next = tournament.clone();
    let mut id = next.next_match_id();
    let duration = next.format.match_duration_secs;
    for (i, home) in tournament.teams.iter().enumerate() {
        for away in &tournament.teams[i + 1..] {
            next.matches.push(Match::pending(
                id,
                Round::Group,
                Some(home.key.clone()),
                Some(away.key.clone()),
                duration,
            ));
            id += 1;
        }
    }
    next.phase = Phase::GroupStage;

    debug!(
        "Tournament {} entered group stage with {} fixtures",
        next.id,
        next.matches.len()
    );
    Ok(next)
}

/// Attempt the next progression step.
///
/// - `groupStage`: once every group match is completed, seeds the top N from
///   the group table (1 v N, 2 v N-1) and moves to `knockout`
/// - `knockout`: once both semifinals are completed, fills the final (and the
///   third-place match); once the final is completed, records its winner as
///   champion and moves to `completed`. A third-place match still pending at
///   that point is left unplayed.
pub fn advance(tournament: &Tournament) -> Result<Tournament, PreconditionNotMet> {
    match tournament.phase {
        Phase::Setup => Err(PreconditionNotMet::WrongPhase {
            expected: Phase::GroupStage,
            actual: Phase::Setup,
        }),
        Phase::GroupStage => enter_knockout(tournament),
        Phase::Knockout => advance_knockout(tournament),
        Phase::Completed => Err(PreconditionNotMet::AlreadyCompleted),
    }
}

fn enter_knockout(tournament: &Tournament) -> Result<Tournament, PreconditionNotMet> {
    let remaining = tournament.group_matches().filter(|m| !m.is_completed()).count();
    if remaining > 0 {
        return Err(PreconditionNotMet::GroupMatchesOutstanding { remaining });
    }

    let n = tournament.format.knockout_qualifiers;
    if n != 2 && n != 4 {
        return Err(PreconditionNotMet::UnsupportedQualifiers(n));
    }
    if tournament.teams.len() < n {
        return Err(PreconditionNotMet::NotEnoughTeams {
            needed: n,
            current: tournament.teams.len(),
        });
    }

    let group: Vec<Match> = tournament.group_matches().cloned().collect();
    let rows = compute_standings(&group, &tournament.teams);
    let seeds = qualifiers(&rows, n);

    let mut next = tournament.clone();
    let mut id = next.next_match_id();
    let duration = next.format.match_duration_secs;
    let mut push = |round: Round, t1: Option<TeamKey>, t2: Option<TeamKey>| {
        next.matches.push(Match::pending(id, round, t1, t2, duration));
        id += 1;
    };

    if n == 2 {
        push(Round::Final, Some(seeds[0].clone()), Some(seeds[1].clone()));
    } else {
        push(Round::Semifinal, Some(seeds[0].clone()), Some(seeds[3].clone()));
        push(Round::Semifinal, Some(seeds[1].clone()), Some(seeds[2].clone()));
        push(Round::Final, None, None);
        if tournament.format.third_place_match {
            push(Round::ThirdPlace, None, None);
        }
    }
    next.phase = Phase::Knockout;

    debug!("Tournament {} entered knockout, seeds {:?}", next.id, seeds);
    Ok(next)
}

fn advance_knockout(tournament: &Tournament) -> Result<Tournament, PreconditionNotMet> {
    // A drawn third-place match decides nothing further
    if let Some(drawn) = tournament
        .knockout_matches()
        .filter(|m| m.round != Round::ThirdPlace)
        .find(|m| m.winner().is_none() && m.outcome().is_some())
    {
        return Err(PreconditionNotMet::UnresolvedKnockoutDraw { match_id: drawn.id });
    }

    let final_has_slots = tournament
        .final_match()
        .map(|m| m.teams().is_some())
        .unwrap_or(false);

    if !final_has_slots {
        let semis: Vec<&Match> = tournament
            .matches
            .iter()
            .filter(|m| m.round == Round::Semifinal)
            .collect();
        let remaining = semis.iter().filter(|m| !m.is_completed()).count();
        if remaining > 0 || semis.is_empty() {
            return Err(PreconditionNotMet::KnockoutMatchesOutstanding { remaining });
        }

        let winners: Vec<Option<TeamKey>> =
            semis.iter().map(|m| m.winner().map(str::to_string)).collect();
        let losers: Vec<Option<TeamKey>> =
            semis.iter().map(|m| m.loser().map(str::to_string)).collect();

        let mut next = tournament.clone();
        for m in next.matches.iter_mut() {
            match m.round {
                Round::Final => {
                    m.team1_key = winners[0].clone();
                    m.team2_key = winners.get(1).cloned().flatten();
                }
                Round::ThirdPlace => {
                    m.team1_key = losers[0].clone();
                    m.team2_key = losers.get(1).cloned().flatten();
                }
                _ => {}
            }
        }
        debug!("Tournament {} final is set: {:?}", next.id, winners);
        return Ok(next);
    }

    let champion = match tournament.final_match() {
        Some(m) if m.is_completed() => m.winner().map(str::to_string),
        _ => None,
    };
    let Some(champion) = champion else {
        return Err(PreconditionNotMet::KnockoutMatchesOutstanding { remaining: 1 });
    };

    let mut next = tournament.clone();
    next.champion = Some(champion);
    next.phase = Phase::Completed;

    debug!("Tournament {} completed, champion {:?}", next.id, next.champion);
    Ok(next)
}
