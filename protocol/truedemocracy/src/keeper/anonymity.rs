use super::Keeper;
use crate::context::Ctx;
use crate::error::{Error, Result};
use crate::events::{self, Event};
use crate::keys;
use crate::params::MERKLE_ROOT_HISTORY_SIZE;
use crate::types::Domain;
use tracing::info;
use zk_core::{fr_from_hex, fr_to_hex, MerkleTree, MERKLE_TREE_DEPTH};

/// Root of the depth-20 tree over hex commitments, in insertion order.
pub(crate) fn compute_merkle_root(commitments: &[String]) -> Result<String> {
    let leaves = commitments
        .iter()
        .map(|c| fr_from_hex(c))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::logic(format!("stored commitment: {e}")))?;
    let tree = MerkleTree::build_from_leaves(MERKLE_TREE_DEPTH, &leaves)
        .map_err(|e| Error::invalid(e.to_string()))?;
    Ok(fr_to_hex(&tree.root()))
}

/// Current root or any root still in the history window.
pub(crate) fn is_accepted_merkle_root(domain: &Domain, root_hex: &str) -> bool {
    domain.merkle_root == root_hex || domain.merkle_root_history.iter().any(|r| r == root_hex)
}

impl Keeper {
    pub fn get_verifying_key(&self, ctx: &Ctx<'_>) -> Option<Vec<u8>> {
        ctx.get(keys::VERIFYING_KEY)
    }

    pub fn set_verifying_key(&self, ctx: &mut Ctx<'_>, vk: &[u8]) {
        ctx.set(keys::VERIFYING_KEY, vk);
    }

    /// Stored key, or the deterministic setup's key persisted on first use.
    pub fn ensure_verifying_key(&self, ctx: &mut Ctx<'_>) -> Result<Vec<u8>> {
        if let Some(vk) = self.get_verifying_key(ctx) {
            return Ok(vk);
        }
        let vk = zk_program_membership::verifying_key_bytes()
            .map_err(|e| Error::logic(format!("membership setup: {e}")))?;
        self.set_verifying_key(ctx, &vk);
        info!("membership verifying key initialised ({} bytes)", vk.len());
        Ok(vk)
    }

    /// Adds a MiMC identity commitment and rebuilds the root. The previous
    /// root stays acceptable through the history window.
    pub fn register_identity_commitment(
        &self,
        ctx: &mut Ctx<'_>,
        domain_name: &str,
        member: &str,
        commitment_hex: &str,
    ) -> Result<()> {
        let mut domain = self.require_domain(ctx, domain_name)?;
        if !domain.is_member(member) {
            return Err(Error::unauthorized(
                "only domain members can register identity commitments",
            ));
        }
        if commitment_hex.len() != 64 {
            return Err(Error::invalid("commitment must be 64 hex chars"));
        }
        let commitment = fr_from_hex(commitment_hex)
            .map_err(|e| Error::invalid(format!("commitment: {e}")))?;
        let canonical = fr_to_hex(&commitment);
        if domain.identity_commitments.contains(&canonical) {
            return Err(Error::invalid("commitment already registered"));
        }
        domain.identity_commitments.push(canonical);

        if !domain.merkle_root.is_empty() {
            let previous = std::mem::take(&mut domain.merkle_root);
            domain.merkle_root_history.push(previous);
            let overflow = domain
                .merkle_root_history
                .len()
                .saturating_sub(MERKLE_ROOT_HISTORY_SIZE);
            domain.merkle_root_history.drain(..overflow);
        }
        domain.merkle_root = compute_merkle_root(&domain.identity_commitments)?;
        self.set_domain(ctx, &domain)?;
        ctx.emit(
            Event::new(events::REGISTER_IDENTITY_COMMITMENT)
                .attr("domain", domain_name)
                .attr("merkle_root", &domain.merkle_root),
        );
        Ok(())
    }

    pub fn is_nullifier_used(&self, ctx: &Ctx<'_>, domain_name: &str, nullifier_hex: &str) -> bool {
        ctx.has(&keys::nullifier(domain_name, nullifier_hex))
    }

    /// Height at which the nullifier was consumed, if it was.
    pub fn nullifier_height(
        &self,
        ctx: &Ctx<'_>,
        domain_name: &str,
        nullifier_hex: &str,
    ) -> Option<i64> {
        let bytes = ctx.get(&keys::nullifier(domain_name, nullifier_hex))?;
        let raw: [u8; 8] = bytes.as_slice().try_into().ok()?;
        Some(i64::from_be_bytes(raw))
    }

    pub(crate) fn set_nullifier_used(
        &self,
        ctx: &mut Ctx<'_>,
        domain_name: &str,
        nullifier_hex: &str,
    ) {
        let height = ctx.block_height();
        ctx.set(&keys::nullifier(domain_name, nullifier_hex), &height.to_be_bytes());
    }

    pub(crate) fn purge_nullifiers(&self, ctx: &mut Ctx<'_>, domain_name: &str) -> usize {
        ctx.delete_prefix(&keys::nullifier_prefix(domain_name))
    }
}
