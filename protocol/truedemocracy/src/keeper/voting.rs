use super::anonymity::is_accepted_merkle_root;
use super::permission::has_domain_key_voted;
use super::Keeper;
use crate::context::Ctx;
use crate::crypto::{decode_pub_key_hex, verify_signature, vote_payload};
use crate::error::{Error, Result};
use crate::events::{self, Event};
use crate::params::{RATING_MAX, RATING_MIN};
use crate::types::{Domain, Rating};
use zk_core::{external_nullifier, fr_from_hex, fr_to_hex, vote_context};
use zk_program_membership::PublicInputs;

fn check_rating(rating: i32) -> Result<()> {
    if !(RATING_MIN..=RATING_MAX).contains(&rating) {
        return Err(Error::invalid("rating must be between -5 and +5"));
    }
    Ok(())
}

fn locate(domain: &Domain, issue: &str, suggestion: &str) -> Result<(usize, usize)> {
    domain
        .locate(issue, suggestion)
        .ok_or_else(|| Error::unknown("issue or suggestion not found"))
}

impl Keeper {
    /// Appends the rating, bumps issue activity and pays the rating reward
    /// out of the treasury. The reward is booked but never sent anywhere.
    fn record_rating(
        &self,
        ctx: &mut Ctx<'_>,
        mut domain: Domain,
        (i, s): (usize, usize),
        rating: Rating,
    ) -> Result<u128> {
        let now = ctx.block_time();
        domain.issues[i].suggestions[s].ratings.push(rating);
        domain.issues[i].last_activity_at = now;
        let reward = domain.pay_reward();
        self.set_domain(ctx, &domain)?;
        ctx.emit(
            Event::new(events::RATE_PROPOSAL)
                .attr("domain", &domain.name)
                .attr("issue", &domain.issues[i].name)
                .attr("suggestion", &domain.issues[i].suggestions[s].name)
                .attr("reward", reward),
        );
        Ok(reward)
    }

    /// Rating signed by a key from the permission register.
    #[allow(clippy::too_many_arguments)]
    pub fn rate_proposal_with_signature(
        &self,
        ctx: &mut Ctx<'_>,
        domain_name: &str,
        issue: &str,
        suggestion: &str,
        rating: i32,
        domain_pub_key_hex: &str,
        signature_hex: &str,
    ) -> Result<u128> {
        check_rating(rating)?;
        let domain = self.require_domain(ctx, domain_name)?;
        let position = locate(&domain, issue, suggestion)?;
        if !domain.permission_register.iter().any(|k| k == domain_pub_key_hex) {
            return Err(Error::unauthorized("domain key not in permission register"));
        }
        let key = decode_pub_key_hex(domain_pub_key_hex)?;
        let payload = vote_payload(domain_name, issue, suggestion, rating);
        if !verify_signature(&key, payload.as_bytes(), signature_hex)? {
            return Err(Error::unauthorized("signature verification failed"));
        }
        if has_domain_key_voted(&domain, issue, suggestion, domain_pub_key_hex) {
            return Err(Error::invalid("domain key has already voted on this suggestion"));
        }
        self.record_rating(ctx, domain, position, Rating::signed(domain_pub_key_hex, rating))
    }

    /// Rating backed by a Groth16 membership proof. `merkle_root_hex` may
    /// name a recent historical root; empty means the current one.
    #[allow(clippy::too_many_arguments)]
    pub fn rate_proposal_with_zkp(
        &self,
        ctx: &mut Ctx<'_>,
        domain_name: &str,
        issue: &str,
        suggestion: &str,
        rating: i32,
        proof_hex: &str,
        nullifier_hex: &str,
        merkle_root_hex: &str,
    ) -> Result<u128> {
        check_rating(rating)?;
        let domain = self.require_domain(ctx, domain_name)?;
        let position = locate(&domain, issue, suggestion)?;
        if domain.merkle_root.is_empty() {
            return Err(Error::invalid("no identity commitments registered in domain"));
        }

        let root_hex = if merkle_root_hex.is_empty() {
            domain.merkle_root.clone()
        } else if is_accepted_merkle_root(&domain, merkle_root_hex) {
            merkle_root_hex.to_string()
        } else {
            return Err(Error::unauthorized("merkle root is not current or recent"));
        };
        let merkle_root =
            fr_from_hex(&root_hex).map_err(|e| Error::logic(format!("stored root: {e}")))?;

        if nullifier_hex.len() != 64 {
            return Err(Error::invalid("nullifier must be 64 hex chars"));
        }
        let nullifier = fr_from_hex(nullifier_hex)
            .map_err(|e| Error::invalid(format!("nullifier: {e}")))?;
        // Keyed by the canonical lowercase form so case variants collide.
        let nullifier_hex = fr_to_hex(&nullifier);
        if self.is_nullifier_used(ctx, domain_name, &nullifier_hex) {
            return Err(Error::invalid("nullifier already used"));
        }

        let proof = hex::decode(proof_hex).map_err(|_| Error::invalid("proof is not hex"))?;
        let vk = self.ensure_verifying_key(ctx)?;
        let public = PublicInputs {
            merkle_root,
            nullifier_hash: nullifier,
            external_nullifier: external_nullifier(&vote_context(domain_name, issue, suggestion)),
        };
        match zk_program_membership::verify(&vk, &proof, &public) {
            Ok(true) => {}
            Ok(false) => return Err(Error::unauthorized("membership proof rejected")),
            Err(e) => return Err(Error::unauthorized(format!("membership proof rejected: {e}"))),
        }

        self.set_nullifier_used(ctx, domain_name, &nullifier_hex);
        self.record_rating(ctx, domain, position, Rating::zk(nullifier_hex, rating))
    }
}
