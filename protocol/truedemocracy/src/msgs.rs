//! Transaction messages. Each variant names the account acting on it;
//! the host is expected to have checked that account's signature.

use crate::error::{Error, Result};
use crate::keys;
use crate::params::{RATING_MAX, RATING_MIN};
use crate::types::{Coin, Coins, DomainOptions};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Msg {
    CreateDomain {
        name: String,
        admin: String,
        initial_coins: Coins,
    },
    AddMember {
        domain: String,
        member: String,
        caller: String,
    },
    UpdateDomainOptions {
        domain: String,
        caller: String,
        options: DomainOptions,
    },
    SubmitProposal {
        domain: String,
        issue: String,
        suggestion: String,
        creator: String,
        fee: u128,
        #[serde(default)]
        external_link: String,
    },
    RegisterValidator {
        operator: String,
        pub_key_hex: String,
        stake: Coins,
        domain: String,
    },
    WithdrawStake {
        operator: String,
        amount: u128,
    },
    RemoveValidator {
        operator: String,
    },
    Unjail {
        operator: String,
    },
    JoinPermissionRegister {
        domain: String,
        member: String,
        domain_pub_key_hex: String,
    },
    PurgePermissionRegister {
        domain: String,
        caller: String,
    },
    OnboardToDomain {
        domain: String,
        caller: String,
        global_pub_key_hex: String,
        domain_pub_key_hex: String,
        signature_hex: String,
    },
    OnboardingRequest {
        domain: String,
        requester: String,
        domain_pub_key_hex: String,
    },
    ApproveOnboarding {
        domain: String,
        requester: String,
        admin: String,
    },
    RejectOnboarding {
        domain: String,
        requester: String,
        admin: String,
    },
    PlaceStoneOnIssue {
        domain: String,
        issue: String,
        member: String,
    },
    PlaceStoneOnSuggestion {
        domain: String,
        issue: String,
        suggestion: String,
        member: String,
    },
    PlaceStoneOnMember {
        domain: String,
        target: String,
        voter: String,
    },
    VoteToExclude {
        domain: String,
        target: String,
        voter: String,
    },
    VoteToDelete {
        domain: String,
        issue: String,
        suggestion: String,
        member: String,
    },
    /// Anonymous rating signed by a registered domain key. No account
    /// signs this; the domain key is the only authority.
    RateWithSignature {
        domain: String,
        issue: String,
        suggestion: String,
        rating: i32,
        domain_pub_key_hex: String,
        signature_hex: String,
    },
    /// Anonymous rating backed by a membership proof.
    RateWithProof {
        domain: String,
        issue: String,
        suggestion: String,
        rating: i32,
        proof_hex: String,
        nullifier_hex: String,
        #[serde(default)]
        merkle_root_hex: String,
    },
    RegisterIdentityCommitment {
        domain: String,
        member: String,
        commitment_hex: String,
    },
    CastElectionVote {
        domain: String,
        issue: String,
        #[serde(default)]
        candidate: String,
        voter: String,
        /// 0 approve, 1 abstain.
        choice: u8,
    },
    DepositToDomain {
        domain: String,
        depositor: String,
        coin: Coin,
    },
    WithdrawFromDomain {
        domain: String,
        caller: String,
        recipient: String,
        coin: Coin,
    },
}

/// Every named field is non-empty and free of the store-key separator.
fn required<S: AsRef<str>>(fields: &[(&str, S)]) -> Result<()> {
    for (name, value) in fields {
        keys::check_name(name, value.as_ref())?;
    }
    Ok(())
}

fn hex_of_len(name: &str, value: &str, len: usize) -> Result<()> {
    if value.len() != len || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::invalid(format!("{name} must be {len} hex chars")));
    }
    Ok(())
}

fn rating_in_range(rating: i32) -> Result<()> {
    if !(RATING_MIN..=RATING_MAX).contains(&rating) {
        return Err(Error::invalid("rating must be between -5 and +5"));
    }
    Ok(())
}

fn positive(coin: &Coin) -> Result<()> {
    if coin.amount == 0 || coin.denom.is_empty() {
        return Err(Error::invalid("coin amount must be positive"));
    }
    Ok(())
}

impl Msg {
    /// Event-style name of the message, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateDomain { .. } => "create_domain",
            Self::AddMember { .. } => "add_member",
            Self::UpdateDomainOptions { .. } => "update_domain_options",
            Self::SubmitProposal { .. } => "submit_proposal",
            Self::RegisterValidator { .. } => "register_validator",
            Self::WithdrawStake { .. } => "withdraw_stake",
            Self::RemoveValidator { .. } => "remove_validator",
            Self::Unjail { .. } => "unjail",
            Self::JoinPermissionRegister { .. } => "join_permission_register",
            Self::PurgePermissionRegister { .. } => "purge_permission_register",
            Self::OnboardToDomain { .. } => "onboard_to_domain",
            Self::OnboardingRequest { .. } => "onboarding_request",
            Self::ApproveOnboarding { .. } => "approve_onboarding",
            Self::RejectOnboarding { .. } => "reject_onboarding",
            Self::PlaceStoneOnIssue { .. } => "place_stone_issue",
            Self::PlaceStoneOnSuggestion { .. } => "place_stone_suggestion",
            Self::PlaceStoneOnMember { .. } => "place_stone_member",
            Self::VoteToExclude { .. } => "vote_exclude",
            Self::VoteToDelete { .. } => "vote_delete",
            Self::RateWithSignature { .. } => "rate_with_signature",
            Self::RateWithProof { .. } => "rate_with_proof",
            Self::RegisterIdentityCommitment { .. } => "register_identity_commitment",
            Self::CastElectionVote { .. } => "cast_election_vote",
            Self::DepositToDomain { .. } => "deposit_to_domain",
            Self::WithdrawFromDomain { .. } => "withdraw_from_domain",
        }
    }

    /// Account that must have signed the transaction. Anonymous ratings
    /// have none.
    pub fn signer(&self) -> Option<&str> {
        let signer = match self {
            Self::CreateDomain { admin, .. } => admin,
            Self::AddMember { caller, .. }
            | Self::UpdateDomainOptions { caller, .. }
            | Self::PurgePermissionRegister { caller, .. }
            | Self::OnboardToDomain { caller, .. }
            | Self::WithdrawFromDomain { caller, .. } => caller,
            Self::SubmitProposal { creator, .. } => creator,
            Self::RegisterValidator { operator, .. }
            | Self::WithdrawStake { operator, .. }
            | Self::RemoveValidator { operator }
            | Self::Unjail { operator } => operator,
            Self::JoinPermissionRegister { member, .. }
            | Self::PlaceStoneOnIssue { member, .. }
            | Self::PlaceStoneOnSuggestion { member, .. }
            | Self::VoteToDelete { member, .. }
            | Self::RegisterIdentityCommitment { member, .. } => member,
            Self::OnboardingRequest { requester, .. } => requester,
            Self::ApproveOnboarding { admin, .. } | Self::RejectOnboarding { admin, .. } => admin,
            Self::PlaceStoneOnMember { voter, .. }
            | Self::VoteToExclude { voter, .. }
            | Self::CastElectionVote { voter, .. } => voter,
            Self::DepositToDomain { depositor, .. } => depositor,
            Self::RateWithSignature { .. } | Self::RateWithProof { .. } => return None,
        };
        Some(signer.as_str())
    }

    /// Stateless checks run before any store access.
    pub fn validate_basic(&self) -> Result<()> {
        match self {
            Self::CreateDomain { name, admin, .. } => required(&[("name", name), ("admin", admin)]),
            Self::AddMember { domain, member, caller } => {
                required(&[("domain", domain), ("member", member), ("caller", caller)])
            }
            Self::UpdateDomainOptions { domain, caller, .. } => {
                required(&[("domain", domain), ("caller", caller)])
            }
            Self::SubmitProposal {
                domain,
                issue,
                suggestion,
                creator,
                ..
            } => required(&[
                ("domain", domain),
                ("issue", issue),
                ("suggestion", suggestion),
                ("creator", creator),
            ]),
            Self::RegisterValidator {
                operator,
                pub_key_hex,
                domain,
                ..
            } => {
                required(&[("operator", operator), ("domain", domain)])?;
                hex_of_len("pub_key_hex", pub_key_hex, 64)
            }
            Self::WithdrawStake { operator, amount } => {
                required(&[("operator", operator)])?;
                if *amount == 0 {
                    return Err(Error::invalid("amount must be positive"));
                }
                Ok(())
            }
            Self::RemoveValidator { operator } | Self::Unjail { operator } => {
                required(&[("operator", operator)])
            }
            Self::JoinPermissionRegister {
                domain,
                member,
                domain_pub_key_hex,
            } => {
                required(&[("domain", domain), ("member", member)])?;
                hex_of_len("domain_pub_key_hex", domain_pub_key_hex, 64)
            }
            Self::PurgePermissionRegister { domain, caller } => {
                required(&[("domain", domain), ("caller", caller)])
            }
            Self::OnboardToDomain {
                domain,
                caller,
                global_pub_key_hex,
                domain_pub_key_hex,
                signature_hex,
            } => {
                required(&[("domain", domain), ("caller", caller)])?;
                hex_of_len("global_pub_key_hex", global_pub_key_hex, 64)?;
                hex_of_len("domain_pub_key_hex", domain_pub_key_hex, 64)?;
                hex_of_len("signature_hex", signature_hex, 128)
            }
            Self::OnboardingRequest {
                domain,
                requester,
                domain_pub_key_hex,
            } => {
                required(&[("domain", domain), ("requester", requester)])?;
                hex_of_len("domain_pub_key_hex", domain_pub_key_hex, 64)
            }
            Self::ApproveOnboarding {
                domain,
                requester,
                admin,
            }
            | Self::RejectOnboarding {
                domain,
                requester,
                admin,
            } => required(&[("domain", domain), ("requester", requester), ("admin", admin)]),
            Self::PlaceStoneOnIssue { domain, issue, member } => {
                required(&[("domain", domain), ("issue", issue), ("member", member)])
            }
            Self::PlaceStoneOnSuggestion {
                domain,
                issue,
                suggestion,
                member,
            }
            | Self::VoteToDelete {
                domain,
                issue,
                suggestion,
                member,
            } => required(&[
                ("domain", domain),
                ("issue", issue),
                ("suggestion", suggestion),
                ("member", member),
            ]),
            Self::PlaceStoneOnMember { domain, target, voter }
            | Self::VoteToExclude { domain, target, voter } => {
                required(&[("domain", domain), ("target", target), ("voter", voter)])
            }
            Self::RateWithSignature {
                domain,
                issue,
                suggestion,
                rating,
                domain_pub_key_hex,
                signature_hex,
            } => {
                required(&[("domain", domain), ("issue", issue), ("suggestion", suggestion)])?;
                rating_in_range(*rating)?;
                hex_of_len("domain_pub_key_hex", domain_pub_key_hex, 64)?;
                hex_of_len("signature_hex", signature_hex, 128)
            }
            Self::RateWithProof {
                domain,
                issue,
                suggestion,
                rating,
                proof_hex,
                nullifier_hex,
                merkle_root_hex,
            } => {
                required(&[
                    ("domain", domain),
                    ("issue", issue),
                    ("suggestion", suggestion),
                    ("proof_hex", proof_hex),
                ])?;
                rating_in_range(*rating)?;
                hex_of_len("nullifier_hex", nullifier_hex, 64)?;
                if !merkle_root_hex.is_empty() {
                    hex_of_len("merkle_root_hex", merkle_root_hex, 64)?;
                }
                Ok(())
            }
            Self::RegisterIdentityCommitment {
                domain,
                member,
                commitment_hex,
            } => {
                required(&[("domain", domain), ("member", member)])?;
                hex_of_len("commitment_hex", commitment_hex, 64)
            }
            Self::CastElectionVote {
                domain,
                issue,
                candidate,
                voter,
                choice,
            } => {
                required(&[("domain", domain), ("issue", issue), ("voter", voter)])?;
                match choice {
                    0 => required(&[("candidate", candidate)]),
                    1 => Ok(()),
                    _ => Err(Error::invalid("choice must be 0 (approve) or 1 (abstain)")),
                }
            }
            Self::DepositToDomain {
                domain,
                depositor,
                coin,
            } => {
                required(&[("domain", domain), ("depositor", depositor)])?;
                positive(coin)
            }
            Self::WithdrawFromDomain {
                domain,
                caller,
                recipient,
                coin,
            } => {
                required(&[("domain", domain), ("caller", caller), ("recipient", recipient)])?;
                positive(coin)
            }
        }
    }
}
