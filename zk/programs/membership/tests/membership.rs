use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem};
use ark_std::rand::{rngs::StdRng, SeedableRng};
use zk_core::{
    external_nullifier, identity_commitment, secret_from_bytes, vote_context, Fr, MerkleTree,
    MERKLE_TREE_DEPTH,
};
use zk_program_membership::{
    decode_proof, decode_verifying_key, encode_proof, encode_verifying_key,
    generate_membership_proof, membership_keys, verify, verifying_key_bytes, MembershipCircuit,
    PublicInputs,
};

fn tree_of(secrets: &[Fr]) -> MerkleTree {
    let leaves: Vec<Fr> = secrets.iter().map(identity_commitment).collect();
    MerkleTree::build_from_leaves(MERKLE_TREE_DEPTH, &leaves).unwrap()
}

fn secrets() -> Vec<Fr> {
    [100u8, 101, 102]
        .iter()
        .map(|b| secret_from_bytes(&[*b]).unwrap())
        .collect()
}

fn circuit_for(tree: &MerkleTree, index: usize, secret: Fr, ext: Fr) -> MembershipCircuit {
    let path = tree.generate_proof(index).unwrap();
    MembershipCircuit {
        merkle_root: tree.root(),
        nullifier_hash: zk_core::nullifier_hash(&secret, &ext),
        external_nullifier: ext,
        identity_secret: secret,
        siblings: path.siblings,
        path_indices: path.path_indices.iter().map(|b| *b == 1).collect(),
    }
}

#[test]
fn circuit_is_satisfied_by_honest_witness() {
    let secrets = secrets();
    let tree = tree_of(&secrets);
    let ext = external_nullifier(&vote_context("D", "C", "G"));
    let cs = ConstraintSystem::<Fr>::new_ref();
    circuit_for(&tree, 2, secrets[2], ext)
        .generate_constraints(cs.clone())
        .unwrap();
    assert!(cs.is_satisfied().unwrap());
    assert_eq!(cs.num_instance_variables(), 4);
}

#[test]
fn circuit_rejects_foreign_secret() {
    let secrets = secrets();
    let tree = tree_of(&secrets);
    let ext = external_nullifier(&vote_context("D", "C", "G"));
    let outsider = secret_from_bytes(&[7]).unwrap();
    let cs = ConstraintSystem::<Fr>::new_ref();
    circuit_for(&tree, 0, outsider, ext)
        .generate_constraints(cs.clone())
        .unwrap();
    assert!(!cs.is_satisfied().unwrap());
}

#[test]
fn groth16_proof_verifies_and_binds_public_inputs() {
    let secrets = secrets();
    let tree = tree_of(&secrets);
    let ext = external_nullifier(&vote_context("D", "C", "G"));
    let mut rng = StdRng::seed_from_u64(42);
    let (proof, public) = generate_membership_proof(&tree, 1, secrets[1], ext, &mut rng).unwrap();
    let vk = verifying_key_bytes().unwrap();

    assert!(verify(&vk, &proof, &public).unwrap());

    let wrong_nullifier = PublicInputs {
        nullifier_hash: zk_core::nullifier_hash(&secrets[0], &ext),
        ..public
    };
    assert!(!verify(&vk, &proof, &wrong_nullifier).unwrap());

    let other_ctx = PublicInputs {
        external_nullifier: external_nullifier(&vote_context("D", "C", "H")),
        ..public
    };
    assert!(!verify(&vk, &proof, &other_ctx).unwrap());

    let stale_root = PublicInputs {
        merkle_root: tree_of(&secrets[..2]).root(),
        ..public
    };
    assert!(!verify(&vk, &proof, &stale_root).unwrap());

    assert!(verify(&vk, &[0u8; 10], &public).is_err());
    assert!(verify(&[1u8; 5], &proof, &public).is_err());
}

#[test]
fn key_and_proof_codecs_are_stable() {
    let keys = membership_keys().unwrap();
    let vk = encode_verifying_key(&keys.verifying_key).unwrap();
    assert_eq!(vk, verifying_key_bytes().unwrap());
    let again = encode_verifying_key(&decode_verifying_key(&vk).unwrap()).unwrap();
    assert_eq!(vk, again);

    let secrets = secrets();
    let tree = tree_of(&secrets);
    let ext = external_nullifier(&vote_context("D", "C", "G"));
    let mut rng = StdRng::seed_from_u64(7);
    let (proof, _) = generate_membership_proof(&tree, 0, secrets[0], ext, &mut rng).unwrap();
    let reencoded = encode_proof(&decode_proof(&proof).unwrap()).unwrap();
    assert_eq!(proof, reencoded);
}
