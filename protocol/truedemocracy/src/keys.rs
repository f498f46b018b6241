//! Store layout. Every key is an ASCII prefix followed by `:`-joined parts.
//! Names embedded in keys may not contain the separator, otherwise one
//! name's prefix scan would reach into another's rows.

use crate::error::{Error, Result};

pub const SEPARATOR: char = ':';

pub const DOMAIN_PREFIX: &str = "domain:";
pub const VALIDATOR_PREFIX: &str = "validator:";
pub const VERIFYING_KEY: &[u8] = b"zkp:verifying-key";
pub const LAST_REWARD_TIME: &[u8] = b"pod:last-reward-time";
pub const TOTAL_RELEASE: &[u8] = b"pod:total-release";
pub const LAST_INTEREST_TIME: &[u8] = b"dom:last-interest-time";

/// Rejects names that are empty or contain [`SEPARATOR`].
pub fn check_name(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::invalid(format!("{field} is required")));
    }
    if value.contains(SEPARATOR) {
        return Err(Error::invalid(format!("{field} must not contain '{SEPARATOR}'")));
    }
    Ok(())
}

pub fn domain(name: &str) -> Vec<u8> {
    format!("{DOMAIN_PREFIX}{name}").into_bytes()
}

pub fn validator(operator: &str) -> Vec<u8> {
    format!("{VALIDATOR_PREFIX}{operator}").into_bytes()
}

pub fn validator_pub_key(pub_key: &[u8]) -> Vec<u8> {
    format!("val-pubkey:{}", hex::encode(pub_key)).into_bytes()
}

pub fn issue_stone(domain: &str, voter: &str) -> Vec<u8> {
    format!("stone:i:{domain}:{voter}").into_bytes()
}

pub fn issue_stone_prefix(domain: &str) -> Vec<u8> {
    format!("stone:i:{domain}:").into_bytes()
}

pub fn suggestion_stone(domain: &str, issue: &str, voter: &str) -> Vec<u8> {
    format!("stone:s:{domain}:{issue}:{voter}").into_bytes()
}

pub fn suggestion_stone_prefix(domain: &str, issue: &str) -> Vec<u8> {
    format!("stone:s:{domain}:{issue}:").into_bytes()
}

pub fn member_stone(domain: &str, voter: &str) -> Vec<u8> {
    format!("stone:m:{domain}:{voter}").into_bytes()
}

pub fn member_stone_prefix(domain: &str) -> Vec<u8> {
    format!("stone:m:{domain}:").into_bytes()
}

pub fn exclude_vote(domain: &str, target: &str, voter: &str) -> Vec<u8> {
    format!("exclvote:{domain}:{target}:{voter}").into_bytes()
}

pub fn exclude_vote_prefix(domain: &str, target: &str) -> Vec<u8> {
    format!("exclvote:{domain}:{target}:").into_bytes()
}

pub fn exclude_vote_domain_prefix(domain: &str) -> Vec<u8> {
    format!("exclvote:{domain}:").into_bytes()
}

pub fn delete_vote(domain: &str, issue: &str, suggestion: &str, voter: &str) -> Vec<u8> {
    format!("delvote:{domain}:{issue}:{suggestion}:{voter}").into_bytes()
}

pub fn delete_vote_prefix(domain: &str, issue: &str, suggestion: &str) -> Vec<u8> {
    format!("delvote:{domain}:{issue}:{suggestion}:").into_bytes()
}

pub fn election_vote(domain: &str, issue: &str, voter: &str) -> Vec<u8> {
    format!("elecvote:{domain}:{issue}:{voter}").into_bytes()
}

pub fn election_vote_prefix(domain: &str, issue: &str) -> Vec<u8> {
    format!("elecvote:{domain}:{issue}:").into_bytes()
}

pub fn purge_schedule(domain: &str) -> Vec<u8> {
    format!("purge-schedule:{domain}").into_bytes()
}

pub fn purge_announced(domain: &str) -> Vec<u8> {
    format!("purge-announced:{domain}").into_bytes()
}

pub fn nullifier(domain: &str, nullifier_hex: &str) -> Vec<u8> {
    format!("nullifier:{domain}:{nullifier_hex}").into_bytes()
}

pub fn nullifier_prefix(domain: &str) -> Vec<u8> {
    format!("nullifier:{domain}:").into_bytes()
}

pub fn onboarding(domain: &str, requester: &str) -> Vec<u8> {
    format!("onboarding:{domain}:{requester}").into_bytes()
}

pub fn interest_mark(domain: &str) -> Vec<u8> {
    format!("dom:interest-mark:{domain}").into_bytes()
}
