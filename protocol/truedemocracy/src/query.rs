//! Read-only queries. Missing entities are `NotFound`.

use crate::context::Ctx;
use crate::error::{Error, Result};
use crate::keeper::{
    find_consensus_winner, rank_suggestions_by_score, sort_issues_by_stones,
    sort_suggestions_by_stones, Keeper, ScoredSuggestion,
};
use crate::types::{
    BigPurgeSchedule, Domain, ElectionResult, Issue, MemberRank, OnboardingRequest, Suggestion,
    Validator,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    Domain { name: String },
    Domains,
    Validator { operator: String },
    Validators,
    ZkpState { domain: String },
    NullifierUsed { domain: String, nullifier_hex: String },
    PurgeSchedule { domain: String },
    OnboardingRequest { domain: String, requester: String },
    IssuesByStones { domain: String },
    SuggestionsByStones { domain: String, issue: String },
    SuggestionsByScore { domain: String, issue: String },
    ConsensusWinner { domain: String, issue: String },
    ElectionTally { domain: String, issue: String },
    MemberStones { domain: String },
    VerifyingKey,
}

/// Anonymity state of one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZkpState {
    pub domain: String,
    pub merkle_root: String,
    pub merkle_root_history: Vec<String>,
    pub commitment_count: usize,
    pub member_count: usize,
    pub verifying_key_initialized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryResponse {
    Domain(Domain),
    Domains(Vec<Domain>),
    Validator(Validator),
    Validators(Vec<Validator>),
    ZkpState(ZkpState),
    NullifierUsed { used: bool, height: Option<i64> },
    PurgeSchedule(BigPurgeSchedule),
    OnboardingRequest(OnboardingRequest),
    Issues(Vec<Issue>),
    Suggestions(Vec<Suggestion>),
    ScoredSuggestions(Vec<ScoredSuggestion>),
    ConsensusWinner(Option<ScoredSuggestion>),
    ElectionTally(ElectionResult),
    MemberStones(Vec<MemberRank>),
    VerifyingKey { vk_hex: String },
}

impl Keeper {
    fn found_domain(&self, ctx: &Ctx<'_>, name: &str) -> Result<Domain> {
        self.get_domain(ctx, name)?
            .ok_or_else(|| Error::not_found(format!("domain {name}")))
    }

    fn found_issue(&self, ctx: &Ctx<'_>, domain: &str, issue: &str) -> Result<Issue> {
        self.found_domain(ctx, domain)?
            .issues
            .into_iter()
            .find(|i| i.name == issue)
            .ok_or_else(|| Error::not_found(format!("issue {domain}/{issue}")))
    }

    pub fn query(&self, ctx: &Ctx<'_>, query: &Query) -> Result<QueryResponse> {
        let response = match query {
            Query::Domain { name } => QueryResponse::Domain(self.found_domain(ctx, name)?),
            Query::Domains => QueryResponse::Domains(self.all_domains(ctx)?),
            Query::Validator { operator } => QueryResponse::Validator(
                self.get_validator(ctx, operator)?
                    .ok_or_else(|| Error::not_found(format!("validator {operator}")))?,
            ),
            Query::Validators => QueryResponse::Validators(self.all_validators(ctx)?),
            Query::ZkpState { domain } => {
                let d = self.found_domain(ctx, domain)?;
                QueryResponse::ZkpState(ZkpState {
                    commitment_count: d.identity_commitments.len(),
                    member_count: d.members.len(),
                    verifying_key_initialized: self.get_verifying_key(ctx).is_some(),
                    domain: d.name,
                    merkle_root: d.merkle_root,
                    merkle_root_history: d.merkle_root_history,
                })
            }
            Query::NullifierUsed { domain, nullifier_hex } => {
                self.found_domain(ctx, domain)?;
                let key = nullifier_hex.to_ascii_lowercase();
                let height = self.nullifier_height(ctx, domain, &key);
                QueryResponse::NullifierUsed {
                    used: self.is_nullifier_used(ctx, domain, &key),
                    height,
                }
            }
            Query::PurgeSchedule { domain } => QueryResponse::PurgeSchedule(
                self.get_purge_schedule(ctx, domain)?
                    .ok_or_else(|| Error::not_found(format!("purge schedule for {domain}")))?,
            ),
            Query::OnboardingRequest { domain, requester } => QueryResponse::OnboardingRequest(
                self.get_onboarding_request(ctx, domain, requester)?
                    .ok_or_else(|| {
                        Error::not_found(format!("onboarding request {domain}/{requester}"))
                    })?,
            ),
            Query::IssuesByStones { domain } => {
                let d = self.found_domain(ctx, domain)?;
                QueryResponse::Issues(sort_issues_by_stones(&d.issues))
            }
            Query::SuggestionsByStones { domain, issue } => QueryResponse::Suggestions(
                sort_suggestions_by_stones(&self.found_issue(ctx, domain, issue)?.suggestions),
            ),
            Query::SuggestionsByScore { domain, issue } => QueryResponse::ScoredSuggestions(
                rank_suggestions_by_score(&self.found_issue(ctx, domain, issue)?.suggestions),
            ),
            Query::ConsensusWinner { domain, issue } => QueryResponse::ConsensusWinner(
                find_consensus_winner(&self.found_issue(ctx, domain, issue)?.suggestions),
            ),
            Query::ElectionTally { domain, issue } => {
                self.found_issue(ctx, domain, issue)?;
                QueryResponse::ElectionTally(self.tally_election(ctx, domain, issue)?)
            }
            Query::MemberStones { domain } => {
                let d = self.found_domain(ctx, domain)?;
                QueryResponse::MemberStones(self.member_stone_counts(ctx, &d))
            }
            Query::VerifyingKey => QueryResponse::VerifyingKey {
                vk_hex: hex::encode(
                    self.get_verifying_key(ctx)
                        .ok_or_else(|| Error::not_found("verifying key"))?,
                ),
            },
        };
        Ok(response)
    }
}
