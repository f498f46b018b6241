use crate::field::{Fr, FIELD_BYTES};
use crate::mimc::mimc_hash;
use crate::{ZkError, ZkResult};
use ark_ff::PrimeField;
use sha2::{Digest, Sha256};

/// `"{domain}|{issue}|{suggestion}"`, the context a nullifier is bound to.
pub fn vote_context(domain: &str, issue: &str, suggestion: &str) -> String {
    format!("{domain}|{issue}|{suggestion}")
}

/// `SHA-256(ctx) mod p`.
pub fn external_nullifier(context: &str) -> Fr {
    let digest = Sha256::digest(context.as_bytes());
    Fr::from_be_bytes_mod_order(&digest)
}

/// Interprets 1..=32 secret bytes as a big-endian scalar, reduced mod p.
pub fn secret_from_bytes(secret: &[u8]) -> ZkResult<Fr> {
    if secret.is_empty() || secret.len() > FIELD_BYTES {
        return Err(ZkError::Encoding(format!(
            "identity secret must be 1-{} bytes, got {}",
            FIELD_BYTES,
            secret.len()
        )));
    }
    Ok(Fr::from_be_bytes_mod_order(secret))
}

/// Leaf of the identity tree: `MiMC(secret)`.
pub fn identity_commitment(secret: &Fr) -> Fr {
    mimc_hash(&[*secret])
}

/// `MiMC(secret, external_nullifier)`; one per identity per vote context.
pub fn nullifier_hash(secret: &Fr, external_nullifier: &Fr) -> Fr {
    mimc_hash(&[*secret, *external_nullifier])
}
