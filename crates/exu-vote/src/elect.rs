//! Consensus algorithms over ranked ballots.
//!
//! Each algorithm works on a private copy of the ballots and is
//! deterministic given its fixed tie-break rules. The tie-breaks replicate
//! the original implementation exactly (first-encountered maxima,
//! worst-aggregate elimination) because downstream experiment selection
//! depends on reproducing them.

use indexmap::IndexMap;

use exu_core::errors::{ErrorInfo, ExuError};

use crate::ballot::{Ballot, Name, Prefer};

/// Counts rank-0 votes per candidate across all ballots.
///
/// The returned map iterates candidates in first-encountered order; every
/// candidate appearing on any ballot is present, with zero when it never
/// placed first.
pub fn count_votes(ballots: &[Ballot]) -> IndexMap<Name, usize> {
    let mut votes: IndexMap<Name, usize> = IndexMap::new();
    for ballot in ballots {
        for (name, candidate) in ballot {
            let entry = votes.entry(name.clone()).or_insert(0);
            if candidate.rank == 0 {
                *entry += 1;
            }
        }
    }
    votes
}

fn no_ballots() -> ExuError {
    ExuError::Vote(ErrorInfo::new(
        "vote-empty",
        "cannot run an election over zero ballots",
    ))
}

fn first_key_with(votes: &IndexMap<Name, usize>, target: usize) -> Option<Name> {
    votes
        .iter()
        .find(|(_, v)| **v == target)
        .map(|(k, _)| k.clone())
}

/// Plurality: the candidate with the most rank-0 votes, ties broken by
/// first-encountered order.
pub fn first_past_post(ballots: &[Ballot]) -> Result<Name, ExuError> {
    let votes = count_votes(ballots);
    let ma = *votes.values().max().ok_or_else(no_ballots)?;
    first_key_with(&votes, ma).ok_or_else(no_ballots)
}

/// Instant-runoff: recursively eliminate the weakest candidate and
/// redistribute their first-place ballots until someone holds a strict
/// majority.
///
/// Elimination ties among the fewest-rank-0 candidates are broken by the
/// highest total rank sum (the worst aggregate showing), first encountered.
/// When every remaining candidate is tied the first encountered wins.
pub fn instant_runoff(ballots: &[Ballot]) -> Result<Name, ExuError> {
    runoff_round(ballots.to_vec())
}

fn runoff_round(mut ballots: Vec<Ballot>) -> Result<Name, ExuError> {
    let votes = count_votes(&ballots);
    let ma = *votes.values().max().ok_or_else(no_ballots)?;

    // strict majority of first-place votes wins outright
    let majority = (ballots.len() as f64 / 2.0).ceil() as usize;
    if ma > majority {
        return first_key_with(&votes, ma).ok_or_else(no_ballots);
    }

    // a full tie cannot be broken by elimination
    if votes.values().all(|v| *v == ma) {
        return first_key_with(&votes, ma).ok_or_else(no_ballots);
    }

    let mi = *votes.values().min().ok_or_else(no_ballots)?;
    let losers: Vec<Name> = votes
        .iter()
        .filter(|(_, v)| **v == mi)
        .map(|(k, _)| k.clone())
        .collect();

    let loser = if losers.len() == 1 {
        losers[0].clone()
    } else {
        // among the tied losers, eliminate the worst aggregate showing
        let mut rank_sums: IndexMap<Name, usize> = IndexMap::new();
        for name in &losers {
            let sum = ballots
                .iter()
                .filter_map(|ballot| ballot.get(name))
                .map(|candidate| candidate.rank)
                .sum();
            rank_sums.insert(name.clone(), sum);
        }
        let worst = *rank_sums.values().max().ok_or_else(no_ballots)?;
        first_key_with(&rank_sums, worst).ok_or_else(no_ballots)?
    };

    for ballot in &mut ballots {
        let was_sole_first = ballot
            .get(&loser)
            .map(|candidate| candidate.rank == 0)
            .unwrap_or(false)
            && ballot.values().filter(|c| c.rank == 0).count() == 1;
        if was_sole_first {
            for candidate in ballot.values_mut() {
                candidate.rank = candidate.rank.saturating_sub(1);
            }
        }
        ballot.shift_remove(&loser);
    }

    runoff_round(ballots)
}

/// Pairwise win matrix for one ballot's rank assignment.
///
/// `matrix[i][j] == 1` when candidate `i` outranks candidate `j`.
fn vote_matrix(ranks: &[usize]) -> Vec<Vec<f64>> {
    let n = ranks.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            if ranks[i] > ranks[j] {
                matrix[j][i] = 1.0;
            } else if ranks[j] > ranks[i] {
                matrix[i][j] = 1.0;
            }
        }
    }
    matrix
}

/// Sums pairwise win matrices over all ballots, in `names` order.
fn sum_matrix(ballots: &[Ballot], names: &[Name]) -> Vec<Vec<f64>> {
    let n = names.len();
    let mut sum = vec![vec![0.0; n]; n];
    for ballot in ballots {
        let ranks: Vec<usize> = names
            .iter()
            .map(|name| ballot.get(name).map(|c| c.rank).unwrap_or(0))
            .collect();
        let matrix = vote_matrix(&ranks);
        for i in 0..n {
            for j in 0..n {
                sum[i][j] += matrix[i][j];
            }
        }
    }
    sum
}

fn copeland_scores(sum: &[Vec<f64>]) -> Vec<f64> {
    let n = sum.len();
    let mut scores = vec![0.0; n];
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            if sum[i][j] > sum[j][i] {
                scores[i] += 1.0;
            } else if sum[i][j] == sum[j][i] {
                scores[i] += 0.5;
            }
        }
    }
    scores
}

fn args_max(values: &[f64]) -> Vec<usize> {
    let mut ties: Vec<usize> = Vec::new();
    let mut ma = f64::NEG_INFINITY;
    for (i, v) in values.iter().enumerate() {
        if *v > ma {
            ties = vec![i];
            ma = *v;
        } else if *v == ma {
            ties.push(i);
        }
    }
    ties
}

/// The candidate with the largest (or smallest) aggregate score summed over
/// ballots. NaN sums (missing results on any ballot) never win.
pub fn high_score(ballots: &[Ballot], prefer: Prefer) -> Result<Name, ExuError> {
    let names: Vec<Name> = ballots
        .first()
        .ok_or_else(no_ballots)?
        .keys()
        .cloned()
        .collect();

    let mut best: Option<(usize, f64)> = None;
    for (i, name) in names.iter().enumerate() {
        let total: f64 = ballots
            .iter()
            .filter_map(|ballot| ballot.get(name))
            .map(|candidate| candidate.score)
            .sum();
        if total.is_nan() {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, current)) => match prefer {
                Prefer::Big => total > current,
                Prefer::Small => total < current,
            },
        };
        if better {
            best = Some((i, total));
        }
    }

    let idx = best.map(|(i, _)| i).unwrap_or(0);
    names
        .get(idx)
        .cloned()
        .ok_or_else(no_ballots)
}

/// Condorcet/Copeland: returns the Condorcet winner when one exists;
/// otherwise the Copeland arg-max, breaking ties by recursively restricting
/// the election to the tied candidates and, failing that, by aggregate
/// score.
pub fn copeland(ballots: &[Ballot], prefer: Prefer) -> Result<Name, ExuError> {
    copeland_round(ballots.to_vec(), prefer)
}

fn copeland_round(mut ballots: Vec<Ballot>, prefer: Prefer) -> Result<Name, ExuError> {
    let names: Vec<Name> = ballots
        .first()
        .ok_or_else(no_ballots)?
        .keys()
        .cloned()
        .collect();
    let sum = sum_matrix(&ballots, &names);

    // a Condorcet winner beats every other candidate head to head
    for (i, name) in names.iter().enumerate() {
        let beats_all = (0..names.len())
            .filter(|j| *j != i)
            .all(|j| sum[i][j] > sum[j][i]);
        if names.len() > 1 && beats_all {
            return Ok(name.clone());
        }
    }

    let scores = copeland_scores(&sum);
    let winners = args_max(&scores);
    if winners.len() == 1 {
        return Ok(names[winners[0]].clone());
    }

    let winner_names: Vec<Name> = winners.iter().map(|i| names[*i].clone()).collect();
    let rest: Vec<Name> = names
        .iter()
        .filter(|name| !winner_names.contains(name))
        .cloned()
        .collect();

    // everyone tied: fall back to the aggregate score
    if rest.is_empty() {
        return high_score(&ballots, prefer);
    }

    for ballot in &mut ballots {
        for loser in &rest {
            ballot.shift_remove(loser);
        }
    }
    copeland_round(ballots, prefer)
}

/// Raynaud: repeatedly eliminate the candidate suffering the single worst
/// pairwise loss (the largest entry of the summed win matrix, row-major
/// first occurrence) until one candidate remains.
pub fn raynaud(ballots: &[Ballot]) -> Result<Name, ExuError> {
    let mut ballots = ballots.to_vec();
    loop {
        let names: Vec<Name> = ballots
            .first()
            .ok_or_else(no_ballots)?
            .keys()
            .cloned()
            .collect();
        if names.len() == 1 {
            return Ok(names[0].clone());
        }

        let sum = sum_matrix(&ballots, &names);
        let mut worst = f64::NEG_INFINITY;
        let mut loser_col = 0;
        for row in &sum {
            for (j, value) in row.iter().enumerate() {
                if *value > worst {
                    worst = *value;
                    loser_col = j;
                }
            }
        }

        let loser = names[loser_col].clone();
        for ballot in &mut ballots {
            ballot.shift_remove(&loser);
        }
    }
}
