//! Ranked-ballot consensus for picking hyperparameter settings that are
//! robust to noise across seeds.
//!
//! One ballot per independent observation (e.g. per random seed) ranks the
//! candidate settings; the election algorithms aggregate the ballots into a
//! single winner with fixed, deterministic tie-breaks.

mod ballot;
mod elect;

pub use ballot::{
    build_ballot, confidence_ranking, score_ranking, Ballot, Name, Prefer, RankedCandidate,
    ScoredCandidate,
};
pub use elect::{copeland, count_votes, first_past_post, high_score, instant_runoff, raynaud};
