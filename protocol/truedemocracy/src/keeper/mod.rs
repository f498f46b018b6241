//! State transitions of the module. `Keeper` carries no state of its own;
//! every method reads and writes through the [`Ctx`](crate::Ctx) it is given,
//! so a failed call leaves nothing behind once its cache is dropped.

mod anonymity;
mod distribution;
mod domain;
mod election;
mod governance;
mod lifecycle;
mod permission;
mod purge;
mod scoring;
mod slashing;
mod stones;
mod treasury_bridge;
mod validator;
mod voting;

pub use lifecycle::{effective_dwell_time, effective_threshold, meets_approval_threshold};
pub use permission::has_domain_key_voted;
pub use scoring::{
    find_consensus_winner, rank_suggestions_by_score, suggestion_score, ScoredSuggestion,
};
pub use stones::{sort_issues_by_stones, sort_suggestions_by_stones};

#[derive(Debug, Clone, Copy, Default)]
pub struct Keeper;

impl Keeper {
    pub fn new() -> Self {
        Self
    }
}
