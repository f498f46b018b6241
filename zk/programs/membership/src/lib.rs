//! Groth16 membership program: "I hold a secret whose commitment is a leaf
//! of this identity tree, and this is my nullifier for this vote context".

mod circuit;

pub use circuit::{mimc_gadget, MembershipCircuit};

use ark_bn254::Bn254;
use ark_groth16::{Groth16, Proof, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::{CircuitSpecificSetupSNARK, SNARK};
use ark_std::rand::{rngs::StdRng, CryptoRng, RngCore, SeedableRng};
use std::sync::OnceLock;
use zk_core::{nullifier_hash, Fr, MerkleTree, ZkError, ZkResult, MERKLE_TREE_DEPTH};

pub const PROGRAM_ID: &str = "truedemocracy.membership.v1";

const SETUP_SEED: &[u8] = b"truedemocracy/membership/groth16-setup/v1";

/// The three values a verifier sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicInputs {
    pub merkle_root: Fr,
    pub nullifier_hash: Fr,
    pub external_nullifier: Fr,
}

impl PublicInputs {
    pub fn to_vec(&self) -> Vec<Fr> {
        vec![self.merkle_root, self.nullifier_hash, self.external_nullifier]
    }
}

#[derive(Debug, Clone)]
pub struct MembershipWitness {
    pub identity_secret: Fr,
    pub siblings: Vec<Fr>,
    pub path_indices: Vec<u8>,
}

pub struct MembershipKeys {
    pub proving_key: ProvingKey<Bn254>,
    pub verifying_key: VerifyingKey<Bn254>,
}

static KEYS: OnceLock<Result<MembershipKeys, ZkError>> = OnceLock::new();

pub fn program_id() -> [u8; 32] {
    *blake3::hash(PROGRAM_ID.as_bytes()).as_bytes()
}

/// Runs the circuit-specific setup from a fixed seed, so every node derives
/// the same key pair. Not a trusted ceremony; suitable for tests and devnets.
pub fn setup_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> ZkResult<MembershipKeys> {
    let (proving_key, verifying_key) =
        Groth16::<Bn254>::setup(MembershipCircuit::blank(), rng)
            .map_err(|e| ZkError::Setup(e.to_string()))?;
    Ok(MembershipKeys {
        proving_key,
        verifying_key,
    })
}

/// Process-wide deterministic keys, generated once on first use.
pub fn membership_keys() -> ZkResult<&'static MembershipKeys> {
    KEYS.get_or_init(|| {
        let seed = *blake3::hash(SETUP_SEED).as_bytes();
        setup_with_rng(&mut StdRng::from_seed(seed))
    })
    .as_ref()
    .map_err(Clone::clone)
}

pub fn verifying_key_bytes() -> ZkResult<Vec<u8>> {
    encode_verifying_key(&membership_keys()?.verifying_key)
}

pub fn prove<R: RngCore + CryptoRng>(
    proving_key: &ProvingKey<Bn254>,
    witness: &MembershipWitness,
    public: &PublicInputs,
    rng: &mut R,
) -> ZkResult<Vec<u8>> {
    if witness.siblings.len() != MERKLE_TREE_DEPTH
        || witness.path_indices.len() != MERKLE_TREE_DEPTH
    {
        return Err(ZkError::Encoding(format!(
            "membership path must have {} levels",
            MERKLE_TREE_DEPTH
        )));
    }
    let circuit = MembershipCircuit {
        merkle_root: public.merkle_root,
        nullifier_hash: public.nullifier_hash,
        external_nullifier: public.external_nullifier,
        identity_secret: witness.identity_secret,
        siblings: witness.siblings.clone(),
        path_indices: witness.path_indices.iter().map(|b| *b == 1).collect(),
    };
    let proof = Groth16::<Bn254>::prove(proving_key, circuit, rng)
        .map_err(|e| ZkError::ProofRejected(e.to_string()))?;
    encode_proof(&proof)
}

/// Builds the witness for leaf `index` of `tree` and proves it with the
/// process-wide keys.
pub fn generate_membership_proof<R: RngCore + CryptoRng>(
    tree: &MerkleTree,
    index: usize,
    identity_secret: Fr,
    external_nullifier: Fr,
    rng: &mut R,
) -> ZkResult<(Vec<u8>, PublicInputs)> {
    if tree.depth() != MERKLE_TREE_DEPTH {
        return Err(ZkError::Encoding(format!(
            "tree depth {} does not match circuit depth {}",
            tree.depth(),
            MERKLE_TREE_DEPTH
        )));
    }
    let path = tree.generate_proof(index)?;
    let public = PublicInputs {
        merkle_root: tree.root(),
        nullifier_hash: nullifier_hash(&identity_secret, &external_nullifier),
        external_nullifier,
    };
    let witness = MembershipWitness {
        identity_secret,
        siblings: path.siblings,
        path_indices: path.path_indices,
    };
    let keys = membership_keys()?;
    let proof = prove(&keys.proving_key, &witness, &public, rng)?;
    Ok((proof, public))
}

/// `Ok(false)` for a well-formed proof that does not satisfy the statement;
/// `Err` when the bytes cannot be decoded.
pub fn verify(verifying_key: &[u8], proof: &[u8], public: &PublicInputs) -> ZkResult<bool> {
    let vk = decode_verifying_key(verifying_key)?;
    let proof = decode_proof(proof)?;
    Groth16::<Bn254>::verify(&vk, &public.to_vec(), &proof)
        .map_err(|e| ZkError::ProofRejected(e.to_string()))
}

pub fn encode_proof(proof: &Proof<Bn254>) -> ZkResult<Vec<u8>> {
    let mut out = Vec::new();
    proof
        .serialize_compressed(&mut out)
        .map_err(|e| ZkError::Serialization(e.to_string()))?;
    Ok(out)
}

pub fn decode_proof(bytes: &[u8]) -> ZkResult<Proof<Bn254>> {
    Proof::deserialize_compressed(bytes).map_err(|e| ZkError::Serialization(e.to_string()))
}

pub fn encode_verifying_key(vk: &VerifyingKey<Bn254>) -> ZkResult<Vec<u8>> {
    let mut out = Vec::new();
    vk.serialize_compressed(&mut out)
        .map_err(|e| ZkError::Serialization(e.to_string()))?;
    Ok(out)
}

pub fn decode_verifying_key(bytes: &[u8]) -> ZkResult<VerifyingKey<Bn254>> {
    VerifyingKey::deserialize_compressed(bytes).map_err(|e| ZkError::Serialization(e.to_string()))
}
