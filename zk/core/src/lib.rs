//! Native primitives shared by the membership circuit and the on-chain
//! verifier: BN254 scalar-field encoding, MiMC, the fixed-depth identity
//! tree, and the commitment / nullifier derivations built on them.

use thiserror::Error;

pub mod field;
pub mod identity;
pub mod merkle;
pub mod mimc;

pub use field::{fr_from_bytes, fr_from_hex, fr_to_bytes, fr_to_hex, Fr, FIELD_BYTES};
pub use identity::{
    external_nullifier, identity_commitment, nullifier_hash, secret_from_bytes, vote_context,
};
pub use merkle::{verify_proof, zero_hashes, MerkleProof, MerkleTree, MERKLE_TREE_DEPTH};
pub use mimc::{mimc_hash, mimc_hash_bytes, round_constants, MIMC_ROUNDS};

/// Alias to keep hashes consistent with the runtime layer.
pub type Hash = [u8; 32];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ZkError {
    #[error("value is not a canonical field element")]
    OutOfField,
    #[error("invalid encoding: {0}")]
    Encoding(String),
    #[error("tree capacity exceeded: {0} leaves")]
    TreeFull(usize),
    #[error("leaf index {index} out of range ({len} leaves)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("proof rejected: {0}")]
    ProofRejected(String),
    #[error("setup failed: {0}")]
    Setup(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type ZkResult<T> = Result<T, ZkError>;
