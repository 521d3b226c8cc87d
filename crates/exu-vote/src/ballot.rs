//! Candidates, ballots, and score-to-rank conversion.

use std::fmt::{self, Display};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Candidate identity: a permutation index or an explicit label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Name {
    /// A sweep permutation index.
    Index(u64),
    /// A named candidate.
    Label(String),
}

impl From<u64> for Name {
    fn from(idx: u64) -> Self {
        Name::Index(idx)
    }
}

impl From<&str> for Name {
    fn from(label: &str) -> Self {
        Name::Label(label.to_string())
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Name::Index(idx) => write!(f, "{idx}"),
            Name::Label(label) => write!(f, "{label}"),
        }
    }
}

/// A candidate with a point estimate and its standard error.
///
/// The raw input to ranking; a missing result is represented with NaN and
/// filtered by the ranking constructors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// Candidate identity.
    pub name: Name,
    /// Point estimate of the candidate's performance.
    pub score: f64,
    /// Standard error of the point estimate.
    pub stderr: f64,
}

impl ScoredCandidate {
    /// Convenience constructor.
    pub fn new(name: impl Into<Name>, score: f64, stderr: f64) -> Self {
        Self {
            name: name.into(),
            score,
            stderr,
        }
    }
}

/// A candidate placed at a rank within one ballot. Rank 0 is preferred and
/// ties share a rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    /// Candidate identity.
    pub name: Name,
    /// Non-negative rank; 0 is most preferred.
    pub rank: usize,
    /// Score carried along for aggregate tie-breaks.
    pub score: f64,
}

impl RankedCandidate {
    /// Convenience constructor.
    pub fn new(name: impl Into<Name>, rank: usize, score: f64) -> Self {
        Self {
            name: name.into(),
            rank,
            score,
        }
    }
}

/// One ranked opinion over a fixed candidate set.
///
/// Iteration order is insertion order; the voting algorithms use
/// first-encountered order as their deterministic tie-break, so ballots
/// must be built consistently.
pub type Ballot = IndexMap<Name, RankedCandidate>;

/// Builds a ballot from ranked candidates, keyed by name.
pub fn build_ballot(candidates: Vec<RankedCandidate>) -> Ballot {
    let mut ballot = Ballot::new();
    for candidate in candidates {
        ballot.insert(candidate.name.clone(), candidate);
    }
    ballot
}

/// Preference direction when converting scores to ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Prefer {
    /// Larger scores are better (returns, accuracies).
    #[default]
    Big,
    /// Smaller scores are better (losses, errors).
    Small,
}

fn filter_nans(scores: &[ScoredCandidate]) -> Vec<ScoredCandidate> {
    scores
        .iter()
        .filter(|s| !s.score.is_nan())
        .cloned()
        .collect()
}

fn order_by_score(scores: &[ScoredCandidate], prefer: Prefer) -> Vec<ScoredCandidate> {
    let mut ordered = filter_nans(scores);
    match prefer {
        Prefer::Big => ordered.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
        Prefer::Small => ordered.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
    }
    ordered
}

/// Ranks candidates strictly by sorted score; every candidate gets its own
/// rank. NaN-scored candidates (missing results) are dropped.
pub fn score_ranking(scores: &[ScoredCandidate], prefer: Prefer) -> Vec<RankedCandidate> {
    order_by_score(scores, prefer)
        .into_iter()
        .enumerate()
        .map(|(rank, s)| RankedCandidate::new(s.name, rank, s.score))
        .collect()
}

fn confidence_interval(scored: &ScoredCandidate, stderrs: f64) -> (f64, f64) {
    (
        scored.score - stderrs * scored.stderr,
        scored.score + stderrs * scored.stderr,
    )
}

fn in_range(a: (f64, f64), b: (f64, f64)) -> bool {
    (a.0 <= b.1 && a.0 >= b.0) || (a.1 <= b.1 && a.1 >= b.0)
}

/// Ranks candidates by score but groups statistically indistinguishable
/// ones: a candidate shares the previous rank while its `score ± k·stderr`
/// interval overlaps the interval that opened the group. NaN-scored
/// candidates are dropped.
pub fn confidence_ranking(
    scores: &[ScoredCandidate],
    stderrs: f64,
    prefer: Prefer,
) -> Vec<RankedCandidate> {
    let ordered = order_by_score(scores, prefer);
    let Some(first) = ordered.first() else {
        return Vec::new();
    };

    let mut rank = 0;
    let mut last_range = confidence_interval(first, stderrs);
    let mut ranks = Vec::with_capacity(ordered.len());
    for scored in &ordered {
        let range = confidence_interval(scored, stderrs);
        if !in_range(range, last_range) {
            rank += 1;
            last_range = range;
        }
        ranks.push(RankedCandidate::new(scored.name.clone(), rank, scored.score));
    }
    ranks
}
