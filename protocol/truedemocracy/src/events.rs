use serde::{Deserialize, Serialize};

pub const CREATE_DOMAIN: &str = "create_domain";
pub const ADD_MEMBER: &str = "add_member";
pub const UPDATE_DOMAIN_OPTIONS: &str = "update_domain_options";
pub const SUBMIT_PROPOSAL: &str = "submit_proposal";
pub const REGISTER_VALIDATOR: &str = "register_validator";
pub const WITHDRAW_STAKE: &str = "withdraw_stake";
pub const REMOVE_VALIDATOR: &str = "remove_validator";
pub const UNJAIL: &str = "unjail";
pub const SLASH: &str = "slash";
pub const JOIN_PERMISSION_REGISTER: &str = "join_permission_register";
pub const PURGE_PERMISSION_REGISTER: &str = "purge_permission_register";
pub const ONBOARDING_REQUEST: &str = "onboarding_request";
pub const ONBOARDING_DECISION: &str = "onboarding_decision";
pub const REGISTER_IDENTITY_COMMITMENT: &str = "register_identity_commitment";
pub const PLACE_STONE_ISSUE: &str = "place_stone_issue";
pub const PLACE_STONE_SUGGESTION: &str = "place_stone_suggestion";
pub const PLACE_STONE_MEMBER: &str = "place_stone_member";
pub const VOTE_EXCLUDE: &str = "vote_exclude";
pub const VOTE_DELETE: &str = "vote_delete";
pub const RATE_PROPOSAL: &str = "rate_proposal";
pub const CAST_ELECTION_VOTE: &str = "cast_election_vote";
pub const BIG_PURGE_ANNOUNCEMENT: &str = "big_purge_announcement";
pub const BIG_PURGE_EXECUTED: &str = "big_purge_executed";
pub const DOMAIN_DEPOSIT: &str = "domain_deposit";
pub const DOMAIN_WITHDRAWAL: &str = "domain_withdrawal";

/// Typed event with ordered string attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: String,
    pub attributes: Vec<(String, String)>,
}

impl Event {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            attributes: Vec::new(),
        }
    }

    pub fn attr(mut self, key: &str, value: impl ToString) -> Self {
        self.attributes.push((key.to_string(), value.to_string()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
