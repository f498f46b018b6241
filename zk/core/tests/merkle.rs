use proptest::prelude::*;
use zk_core::{
    external_nullifier, fr_from_bytes, fr_from_hex, fr_to_bytes, fr_to_hex, identity_commitment,
    mimc_hash, mimc_hash_bytes, nullifier_hash, secret_from_bytes, verify_proof, vote_context,
    zero_hashes, Fr, MerkleTree, ZkError, MERKLE_TREE_DEPTH,
};

fn leaves(n: u64) -> Vec<Fr> {
    (0..n)
        .map(|i| identity_commitment(&Fr::from(100 + i)))
        .collect()
}

#[test]
fn zero_hashes_chain() {
    let zeros = zero_hashes(3);
    assert_eq!(zeros.len(), 4);
    assert_eq!(zeros[0], mimc_hash(&[Fr::from(0u64)]));
    assert_eq!(zeros[2], mimc_hash(&[zeros[1], zeros[1]]));
}

#[test]
fn empty_tree_root_is_top_zero() {
    let tree = MerkleTree::build_from_leaves(MERKLE_TREE_DEPTH, &[]).unwrap();
    assert!(tree.is_empty());
    assert_eq!(tree.root(), zero_hashes(MERKLE_TREE_DEPTH)[MERKLE_TREE_DEPTH]);
    assert!(matches!(
        tree.generate_proof(0),
        Err(ZkError::IndexOutOfRange { index: 0, len: 0 })
    ));
}

#[test]
fn single_leaf_proof_verifies() {
    let leaves = leaves(1);
    let tree = MerkleTree::build_from_leaves(MERKLE_TREE_DEPTH, &leaves).unwrap();
    let proof = tree.generate_proof(0).unwrap();
    assert_eq!(proof.siblings.len(), MERKLE_TREE_DEPTH);
    assert!(proof.path_indices.iter().all(|b| *b == 0));
    assert!(verify_proof(
        &tree.root(),
        &leaves[0],
        &proof.siblings,
        &proof.path_indices
    ));
}

#[test]
fn capacity_is_enforced() {
    let full = leaves(4);
    assert!(MerkleTree::build_from_leaves(2, &full).is_ok());
    let over = leaves(5);
    assert_eq!(
        MerkleTree::build_from_leaves(2, &over).unwrap_err(),
        ZkError::TreeFull(5)
    );
}

#[test]
fn tampered_proofs_fail() {
    let leaves = leaves(3);
    let tree = MerkleTree::build_from_leaves(MERKLE_TREE_DEPTH, &leaves).unwrap();
    let proof = tree.generate_proof(2).unwrap();
    assert!(!verify_proof(
        &tree.root(),
        &leaves[1],
        &proof.siblings,
        &proof.path_indices
    ));
    let mut bad_bits = proof.path_indices.clone();
    bad_bits[0] = 2;
    assert!(!verify_proof(&tree.root(), &leaves[2], &proof.siblings, &bad_bits));
    assert!(!verify_proof(
        &tree.root(),
        &leaves[2],
        &proof.siblings[1..],
        &proof.path_indices
    ));
}

#[test]
fn field_encoding_rejects_modulus_and_long_input() {
    assert_eq!(fr_from_bytes(&[0xff; 32]).unwrap_err(), ZkError::OutOfField);
    assert!(matches!(fr_from_bytes(&[1u8; 33]), Err(ZkError::Encoding(_))));
    assert!(fr_from_hex("zz").is_err());
    let v = Fr::from(123_456u64);
    assert_eq!(fr_from_hex(&fr_to_hex(&v)).unwrap(), v);
    assert_eq!(fr_from_bytes(&[0x01, 0x00]).unwrap(), Fr::from(256u64));
}

#[test]
fn mimc_bytes_match_field_hash() {
    let a = Fr::from(7u64);
    let b = Fr::from(9u64);
    let bytes = mimc_hash_bytes(&[fr_to_bytes(&a), fr_to_bytes(&b)]).unwrap();
    assert_eq!(bytes, fr_to_bytes(&mimc_hash(&[a, b])));
    assert_ne!(mimc_hash(&[a, b]), mimc_hash(&[b, a]));
    assert!(mimc_hash_bytes(&[[0xff; 32]]).is_err());
}

#[test]
fn nullifiers_are_deterministic_and_context_bound() {
    let secret = secret_from_bytes(&[100]).unwrap();
    let other = secret_from_bytes(&[101]).unwrap();
    let ext = external_nullifier(&vote_context("D", "C", "G"));
    let ext2 = external_nullifier(&vote_context("D", "C", "H"));

    assert_eq!(nullifier_hash(&secret, &ext), nullifier_hash(&secret, &ext));
    assert_ne!(nullifier_hash(&secret, &ext), nullifier_hash(&other, &ext));
    assert_ne!(nullifier_hash(&secret, &ext), nullifier_hash(&secret, &ext2));
    assert!(secret_from_bytes(&[]).is_err());
    assert!(secret_from_bytes(&[1u8; 33]).is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn every_leaf_proves_against_the_root(n in 1u64..12, depth in 4usize..8) {
        let leaves = leaves(n);
        let tree = MerkleTree::build_from_leaves(depth, &leaves).unwrap();
        let rebuilt = MerkleTree::build_from_leaves(depth, &leaves).unwrap();
        prop_assert_eq!(tree.root(), rebuilt.root());
        for (i, leaf) in leaves.iter().enumerate() {
            let proof = tree.generate_proof(i).unwrap();
            prop_assert!(verify_proof(&tree.root(), leaf, &proof.siblings, &proof.path_indices));
        }
    }
}
