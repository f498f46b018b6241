//! Message dispatch. The keeper step runs first; coin movement through the
//! optional [`CoinMover`] follows. Callers run this inside a cache overlay,
//! so a failed transfer discards the keeper's writes as well.

use crate::bank::CoinMover;
use crate::context::Ctx;
use crate::error::{Error, Result};
use crate::keeper::Keeper;
use crate::msgs::Msg;
use crate::params::MODULE_NAME;
use crate::types::{Coins, VoteChoice};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MsgResponse {
    Ok,
    /// Treasury reward booked for the action.
    Reward { amount: u128 },
    Excluded { excluded: bool },
    Deleted { deleted: bool },
}

fn decode_hex(name: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value).map_err(|_| Error::invalid(format!("{name} is not hex")))
}

async fn pull(bank: Option<&dyn CoinMover>, from: &str, coins: &Coins) -> Result<()> {
    match bank {
        Some(bank) if !coins.is_empty() => {
            bank.send_from_account_to_module(from, MODULE_NAME, coins).await
        }
        _ => Ok(()),
    }
}

async fn push(bank: Option<&dyn CoinMover>, to: &str, coins: &Coins) -> Result<()> {
    match bank {
        Some(bank) if !coins.is_empty() => {
            bank.send_from_module_to_account(MODULE_NAME, to, coins).await
        }
        _ => Ok(()),
    }
}

impl Keeper {
    pub async fn handle(
        &self,
        ctx: &mut Ctx<'_>,
        bank: Option<&dyn CoinMover>,
        msg: &Msg,
    ) -> Result<MsgResponse> {
        match msg {
            Msg::CreateDomain {
                name,
                admin,
                initial_coins,
            } => {
                self.create_domain(ctx, name, admin, initial_coins.clone())?;
                pull(bank, admin, initial_coins).await?;
                Ok(MsgResponse::Ok)
            }
            Msg::AddMember {
                domain,
                member,
                caller,
            } => {
                self.add_member(ctx, domain, member, caller)?;
                Ok(MsgResponse::Ok)
            }
            Msg::UpdateDomainOptions {
                domain,
                caller,
                options,
            } => {
                self.update_domain_options(ctx, domain, caller, options.clone())?;
                Ok(MsgResponse::Ok)
            }
            Msg::SubmitProposal {
                domain,
                issue,
                suggestion,
                creator,
                fee,
                external_link,
            } => {
                self.submit_proposal(ctx, domain, issue, suggestion, creator, *fee, external_link)?;
                pull(bank, creator, &Coins::pnyx(*fee)).await?;
                Ok(MsgResponse::Ok)
            }
            Msg::RegisterValidator {
                operator,
                pub_key_hex,
                stake,
                domain,
            } => {
                let pub_key = decode_hex("pub_key_hex", pub_key_hex)?;
                self.register_validator(ctx, operator, &pub_key, stake.clone(), domain)?;
                pull(bank, operator, stake).await?;
                Ok(MsgResponse::Ok)
            }
            Msg::WithdrawStake { operator, amount } => {
                let released = self.withdraw_stake(ctx, operator, *amount)?;
                push(bank, operator, &released).await?;
                Ok(MsgResponse::Ok)
            }
            Msg::RemoveValidator { operator } => {
                let released = self.remove_validator(ctx, operator)?;
                push(bank, operator, &released).await?;
                Ok(MsgResponse::Ok)
            }
            Msg::Unjail { operator } => {
                self.unjail(ctx, operator)?;
                Ok(MsgResponse::Ok)
            }
            Msg::JoinPermissionRegister {
                domain,
                member,
                domain_pub_key_hex,
            } => {
                let key = decode_hex("domain_pub_key_hex", domain_pub_key_hex)?;
                self.join_permission_register(ctx, domain, member, &key)?;
                Ok(MsgResponse::Ok)
            }
            Msg::PurgePermissionRegister { domain, caller } => {
                self.purge_permission_register(ctx, domain, caller)?;
                Ok(MsgResponse::Ok)
            }
            Msg::OnboardToDomain {
                domain,
                caller,
                global_pub_key_hex,
                domain_pub_key_hex,
                signature_hex,
            } => {
                self.onboard_to_domain(
                    ctx,
                    caller,
                    domain,
                    global_pub_key_hex,
                    domain_pub_key_hex,
                    signature_hex,
                )?;
                Ok(MsgResponse::Ok)
            }
            Msg::OnboardingRequest {
                domain,
                requester,
                domain_pub_key_hex,
            } => {
                self.submit_onboarding_request(ctx, domain, requester, domain_pub_key_hex)?;
                Ok(MsgResponse::Ok)
            }
            Msg::ApproveOnboarding {
                domain,
                requester,
                admin,
            } => {
                self.approve_onboarding_request(ctx, domain, requester, admin)?;
                Ok(MsgResponse::Ok)
            }
            Msg::RejectOnboarding {
                domain,
                requester,
                admin,
            } => {
                self.reject_onboarding_request(ctx, domain, requester, admin)?;
                Ok(MsgResponse::Ok)
            }
            Msg::PlaceStoneOnIssue { domain, issue, member } => {
                let amount = self.place_stone_on_issue(ctx, domain, issue, member)?;
                push(bank, member, &Coins::pnyx(amount)).await?;
                Ok(MsgResponse::Reward { amount })
            }
            Msg::PlaceStoneOnSuggestion {
                domain,
                issue,
                suggestion,
                member,
            } => {
                let amount =
                    self.place_stone_on_suggestion(ctx, domain, issue, suggestion, member)?;
                push(bank, member, &Coins::pnyx(amount)).await?;
                Ok(MsgResponse::Reward { amount })
            }
            Msg::PlaceStoneOnMember { domain, target, voter } => {
                self.place_stone_on_member(ctx, domain, target, voter)?;
                Ok(MsgResponse::Ok)
            }
            Msg::VoteToExclude { domain, target, voter } => {
                let excluded = self.vote_to_exclude(ctx, domain, target, voter)?;
                Ok(MsgResponse::Excluded { excluded })
            }
            Msg::VoteToDelete {
                domain,
                issue,
                suggestion,
                member,
            } => {
                let deleted = self.vote_to_delete(ctx, domain, issue, suggestion, member)?;
                Ok(MsgResponse::Deleted { deleted })
            }
            // Rating rewards stay unsent: paying an account would link it
            // to the anonymous vote.
            Msg::RateWithSignature {
                domain,
                issue,
                suggestion,
                rating,
                domain_pub_key_hex,
                signature_hex,
            } => {
                let amount = self.rate_proposal_with_signature(
                    ctx,
                    domain,
                    issue,
                    suggestion,
                    *rating,
                    domain_pub_key_hex,
                    signature_hex,
                )?;
                Ok(MsgResponse::Reward { amount })
            }
            Msg::RateWithProof {
                domain,
                issue,
                suggestion,
                rating,
                proof_hex,
                nullifier_hex,
                merkle_root_hex,
            } => {
                let amount = self.rate_proposal_with_zkp(
                    ctx,
                    domain,
                    issue,
                    suggestion,
                    *rating,
                    proof_hex,
                    nullifier_hex,
                    merkle_root_hex,
                )?;
                Ok(MsgResponse::Reward { amount })
            }
            Msg::RegisterIdentityCommitment {
                domain,
                member,
                commitment_hex,
            } => {
                self.register_identity_commitment(ctx, domain, member, commitment_hex)?;
                Ok(MsgResponse::Ok)
            }
            Msg::CastElectionVote {
                domain,
                issue,
                candidate,
                voter,
                choice,
            } => {
                let choice = VoteChoice::from_code(*choice)
                    .ok_or_else(|| Error::invalid("choice must be 0 (approve) or 1 (abstain)"))?;
                self.cast_election_vote(ctx, domain, issue, candidate, voter, choice)?;
                Ok(MsgResponse::Ok)
            }
            Msg::DepositToDomain {
                domain,
                depositor,
                coin,
            } => {
                self.deposit_to_domain(ctx, bank, domain, depositor, coin).await?;
                Ok(MsgResponse::Ok)
            }
            Msg::WithdrawFromDomain {
                domain,
                caller,
                recipient,
                coin,
            } => {
                self.withdraw_from_domain(ctx, bank, domain, caller, recipient, coin)
                    .await?;
                Ok(MsgResponse::Ok)
            }
        }
    }
}
