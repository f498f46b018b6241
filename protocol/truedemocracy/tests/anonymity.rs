mod common;

use ark_std::rand::{rngs::StdRng, SeedableRng};
use common::{ctx, domain_with, seed_issue, ADMIN, DOMAIN, T0};
use ed25519_dalek::{Signer, SigningKey};
use state::MemStore;
use truedemocracy::crypto::{onboarding_message, vote_payload};
use truedemocracy::{events, keys, Coins, Error, Keeper, OnboardingStatus};
use zk_core::{
    external_nullifier, fr_to_hex, identity_commitment, secret_from_bytes, vote_context, Fr,
    MerkleTree, MERKLE_TREE_DEPTH,
};
use zk_program_membership::generate_membership_proof;

const DAY: i64 = 86_400;

fn sign_hex(key: &SigningKey, message: &str) -> String {
    hex::encode(key.sign(message.as_bytes()).to_bytes())
}

fn pub_hex(key: &SigningKey) -> String {
    hex::encode(key.verifying_key().to_bytes())
}

fn secrets() -> Vec<Fr> {
    [100u8, 101, 102]
        .iter()
        .map(|b| secret_from_bytes(&[*b]).unwrap())
        .collect()
}

/// Registers one commitment per secret, in order, for `ADMIN`, `a`, `b`.
fn register_commitments(store: &mut MemStore, secrets: &[Fr]) -> MerkleTree {
    let keeper = Keeper::new();
    let mut c = ctx(store, T0);
    for (secret, member) in secrets.iter().zip([ADMIN, "a", "b"]) {
        let commitment = fr_to_hex(&identity_commitment(secret));
        keeper
            .register_identity_commitment(&mut c, DOMAIN, member, &commitment)
            .unwrap();
    }
    let leaves: Vec<Fr> = secrets.iter().map(identity_commitment).collect();
    MerkleTree::build_from_leaves(MERKLE_TREE_DEPTH, &leaves).unwrap()
}

#[test]
fn signed_rating_counts_once_per_domain_key() {
    let mut store = MemStore::new();
    domain_with(&mut store, &["alice"], 500_000);
    seed_issue(&mut store, "I", &["S"]);
    let keeper = Keeper::new();
    let mut c = ctx(&mut store, T0);
    let key = SigningKey::from_bytes(&[7u8; 32]);
    keeper
        .join_permission_register(&mut c, DOMAIN, "alice", &key.verifying_key().to_bytes())
        .unwrap();

    let sig = sign_hex(&key, &vote_payload(DOMAIN, "I", "S", 4));
    let reward = keeper
        .rate_proposal_with_signature(&mut c, DOMAIN, "I", "S", 4, &pub_hex(&key), &sig)
        .unwrap();
    assert_eq!(reward, 500);

    let err = keeper
        .rate_proposal_with_signature(&mut c, DOMAIN, "I", "S", 4, &pub_hex(&key), &sig)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));

    let domain = keeper.require_domain(&c, DOMAIN).unwrap();
    let ratings = &domain.issues[0].suggestions[0].ratings;
    assert_eq!(ratings.len(), 1);
    assert_eq!(ratings[0].value, 4);
    assert_eq!(ratings[0].domain_pub_key_hex, pub_hex(&key));
}

#[test]
fn signed_rating_rejects_bad_input() {
    let mut store = MemStore::new();
    domain_with(&mut store, &["alice"], 500_000);
    seed_issue(&mut store, "I", &["S"]);
    let keeper = Keeper::new();
    let mut c = ctx(&mut store, T0);
    let key = SigningKey::from_bytes(&[7u8; 32]);
    let stranger = SigningKey::from_bytes(&[8u8; 32]);
    keeper
        .join_permission_register(&mut c, DOMAIN, "alice", &key.verifying_key().to_bytes())
        .unwrap();

    // Signature over a different rating.
    let sig = sign_hex(&key, &vote_payload(DOMAIN, "I", "S", 4));
    let err = keeper
        .rate_proposal_with_signature(&mut c, DOMAIN, "I", "S", 5, &pub_hex(&key), &sig)
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));

    let sig = sign_hex(&stranger, &vote_payload(DOMAIN, "I", "S", 4));
    let err = keeper
        .rate_proposal_with_signature(&mut c, DOMAIN, "I", "S", 4, &pub_hex(&stranger), &sig)
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));

    let err = keeper
        .rate_proposal_with_signature(&mut c, DOMAIN, "I", "S", 6, &pub_hex(&key), &sig)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));

    let err = keeper
        .rate_proposal_with_signature(&mut c, DOMAIN, "I", "Nope", 4, &pub_hex(&key), &sig)
        .unwrap_err();
    assert!(matches!(err, Error::UnknownRequest(_)));
}

#[test]
fn permission_register_is_members_only_and_purgeable_by_admin() {
    let mut store = MemStore::new();
    domain_with(&mut store, &["alice"], 500_000);
    let keeper = Keeper::new();
    let mut c = ctx(&mut store, T0);

    let err = keeper
        .join_permission_register(&mut c, DOMAIN, "mallory", &[3u8; 32])
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));
    let err = keeper
        .join_permission_register(&mut c, DOMAIN, "alice", &[3u8; 31])
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));

    keeper.join_permission_register(&mut c, DOMAIN, "alice", &[3u8; 32]).unwrap();
    assert!(keeper.is_key_authorized(&c, DOMAIN, &hex::encode([3u8; 32])).unwrap());

    let err = keeper.purge_permission_register(&mut c, DOMAIN, "alice").unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));
    keeper.purge_permission_register(&mut c, DOMAIN, ADMIN).unwrap();
    assert!(!keeper.is_key_authorized(&c, DOMAIN, &hex::encode([3u8; 32])).unwrap());
}

#[test]
fn onboarding_binds_domain_key_with_global_signature() {
    let mut store = MemStore::new();
    domain_with(&mut store, &["alice"], 500_000);
    let keeper = Keeper::new();
    let mut c = ctx(&mut store, T0);
    let global = SigningKey::from_bytes(&[1u8; 32]);
    let domain_key = SigningKey::from_bytes(&[2u8; 32]);
    let domain_hex = pub_hex(&domain_key);

    let err = keeper
        .onboard_to_domain(
            &mut c,
            "alice",
            DOMAIN,
            &pub_hex(&global),
            &pub_hex(&global),
            &sign_hex(&global, &onboarding_message("alice", DOMAIN, &pub_hex(&global))),
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));

    // Signed for a different caller.
    let err = keeper
        .onboard_to_domain(
            &mut c,
            "alice",
            DOMAIN,
            &pub_hex(&global),
            &domain_hex,
            &sign_hex(&global, &onboarding_message("bob", DOMAIN, &domain_hex)),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));

    let sig = sign_hex(&global, &onboarding_message("alice", DOMAIN, &domain_hex));
    keeper
        .onboard_to_domain(&mut c, "alice", DOMAIN, &pub_hex(&global), &domain_hex, &sig)
        .unwrap();
    assert!(keeper.is_key_authorized(&c, DOMAIN, &domain_hex).unwrap());

    let err = keeper
        .onboard_to_domain(&mut c, "alice", DOMAIN, &pub_hex(&global), &domain_hex, &sig)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
}

#[test]
fn onboarding_requests_wait_for_the_admin() {
    let mut store = MemStore::new();
    domain_with(&mut store, &["alice", "bob"], 500_000);
    let keeper = Keeper::new();
    let mut c = ctx(&mut store, T0);
    let alice_key = hex::encode([4u8; 32]);
    let bob_key = hex::encode([5u8; 32]);

    keeper.submit_onboarding_request(&mut c, DOMAIN, "alice", &alice_key).unwrap();
    let err = keeper
        .submit_onboarding_request(&mut c, DOMAIN, "alice", &alice_key)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
    let err = keeper
        .approve_onboarding_request(&mut c, DOMAIN, "alice", "bob")
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));

    keeper.approve_onboarding_request(&mut c, DOMAIN, "alice", ADMIN).unwrap();
    let request = keeper.get_onboarding_request(&c, DOMAIN, "alice").unwrap().unwrap();
    assert_eq!(request.status, OnboardingStatus::Approved);
    assert_eq!(request.requested_at, T0);
    assert!(keeper.is_key_authorized(&c, DOMAIN, &alice_key).unwrap());
    let err = keeper
        .reject_onboarding_request(&mut c, DOMAIN, "alice", ADMIN)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));

    keeper.submit_onboarding_request(&mut c, DOMAIN, "bob", &bob_key).unwrap();
    keeper.reject_onboarding_request(&mut c, DOMAIN, "bob", ADMIN).unwrap();
    assert!(!keeper.is_key_authorized(&c, DOMAIN, &bob_key).unwrap());
    // A decided request may be filed again.
    keeper.submit_onboarding_request(&mut c, DOMAIN, "bob", &bob_key).unwrap();
    let err = keeper
        .approve_onboarding_request(&mut c, DOMAIN, "carol", ADMIN)
        .unwrap_err();
    assert!(matches!(err, Error::UnknownRequest(_)));
}

#[test]
fn commitments_build_the_same_root_as_a_local_tree() {
    let mut store = MemStore::new();
    domain_with(&mut store, &["a", "b"], 500_000);
    let tree = register_commitments(&mut store, &secrets());
    let keeper = Keeper::new();
    let mut c = ctx(&mut store, T0);

    let domain = keeper.require_domain(&c, DOMAIN).unwrap();
    assert_eq!(domain.merkle_root, fr_to_hex(&tree.root()));
    assert_eq!(domain.identity_commitments.len(), 3);
    assert_eq!(domain.merkle_root_history.len(), 2);

    let duplicate = fr_to_hex(&identity_commitment(&secrets()[0]));
    let err = keeper
        .register_identity_commitment(&mut c, DOMAIN, "a", &duplicate)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
    let err = keeper
        .register_identity_commitment(&mut c, DOMAIN, "mallory", &duplicate)
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));
    let err = keeper
        .register_identity_commitment(&mut c, DOMAIN, "a", "abcd")
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
}

#[test]
fn root_history_keeps_the_last_ten_roots() {
    let mut store = MemStore::new();
    domain_with(&mut store, &[], 500_000);
    let keeper = Keeper::new();
    let mut c = ctx(&mut store, T0);
    for seed in 0..13u8 {
        let secret = secret_from_bytes(&[seed, 1]).unwrap();
        let commitment = fr_to_hex(&identity_commitment(&secret));
        keeper
            .register_identity_commitment(&mut c, DOMAIN, ADMIN, &commitment)
            .unwrap();
    }
    let domain = keeper.require_domain(&c, DOMAIN).unwrap();
    assert_eq!(domain.identity_commitments.len(), 13);
    assert_eq!(domain.merkle_root_history.len(), 10);
    assert!(!domain.merkle_root_history.contains(&domain.merkle_root));
}

#[test]
fn zk_rating_spends_its_nullifier() {
    let mut store = MemStore::new();
    domain_with(&mut store, &["a", "b"], 500_000);
    seed_issue(&mut store, "I", &["S"]);
    let secrets = secrets();
    let tree = register_commitments(&mut store, &secrets);
    let keeper = Keeper::new();
    let mut c = truedemocracy::Ctx::new(&mut store, T0 + 5, 42);

    let ext = external_nullifier(&vote_context(DOMAIN, "I", "S"));
    let mut rng = StdRng::seed_from_u64(7);
    let (proof, public) = generate_membership_proof(&tree, 1, secrets[1], ext, &mut rng).unwrap();
    let nullifier_hex = fr_to_hex(&public.nullifier_hash);

    let proof_hex = hex::encode(&proof);
    let reward = keeper
        .rate_proposal_with_zkp(&mut c, DOMAIN, "I", "S", 3, &proof_hex, &nullifier_hex, "")
        .unwrap();
    assert_eq!(reward, 500);
    assert!(keeper.is_nullifier_used(&c, DOMAIN, &nullifier_hex));
    assert_eq!(keeper.nullifier_height(&c, DOMAIN, &nullifier_hex), Some(42));

    let err = keeper
        .rate_proposal_with_zkp(&mut c, DOMAIN, "I", "S", 3, &proof_hex, &nullifier_hex, "")
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
    let err = keeper
        .rate_proposal_with_zkp(
            &mut c,
            DOMAIN,
            "I",
            "S",
            3,
            &hex::encode(&proof),
            &nullifier_hex.to_uppercase(),
            "",
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));

    let domain = keeper.require_domain(&c, DOMAIN).unwrap();
    let rating = &domain.issues[0].suggestions[0].ratings[0];
    assert_eq!(rating.nullifier_hex, nullifier_hex);
    assert!(rating.domain_pub_key_hex.is_empty());
    assert!(keeper.get_verifying_key(&c).is_some());
}

#[test]
fn zk_proof_against_a_recent_root_still_verifies() {
    let mut store = MemStore::new();
    domain_with(&mut store, &["a", "b", "c"], 500_000);
    seed_issue(&mut store, "I", &["S"]);
    let secrets = secrets();
    let tree = register_commitments(&mut store, &secrets);
    let old_root = fr_to_hex(&tree.root());
    let keeper = Keeper::new();
    let mut c = ctx(&mut store, T0);

    let late = fr_to_hex(&identity_commitment(&secret_from_bytes(&[103]).unwrap()));
    keeper.register_identity_commitment(&mut c, DOMAIN, "c", &late).unwrap();

    let ext = external_nullifier(&vote_context(DOMAIN, "I", "S"));
    let mut rng = StdRng::seed_from_u64(9);
    let (proof, public) = generate_membership_proof(&tree, 0, secrets[0], ext, &mut rng).unwrap();
    let nullifier_hex = fr_to_hex(&public.nullifier_hash);
    let proof_hex = hex::encode(&proof);

    // The current root is newer than the proof's.
    let err = keeper
        .rate_proposal_with_zkp(&mut c, DOMAIN, "I", "S", -2, &proof_hex, &nullifier_hex, "")
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));
    assert!(!keeper.is_nullifier_used(&c, DOMAIN, &nullifier_hex));

    keeper
        .rate_proposal_with_zkp(&mut c, DOMAIN, "I", "S", -2, &proof_hex, &nullifier_hex, &old_root)
        .unwrap();

    let unknown_root = fr_to_hex(&Fr::from(5u64));
    let err = keeper
        .rate_proposal_with_zkp(
            &mut c,
            DOMAIN,
            "I",
            "S",
            -2,
            &proof_hex,
            &nullifier_hex,
            &unknown_root,
        )
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));
}

#[test]
fn zk_rating_needs_registered_commitments() {
    let mut store = MemStore::new();
    domain_with(&mut store, &[], 500_000);
    seed_issue(&mut store, "I", &["S"]);
    let keeper = Keeper::new();
    let mut c = ctx(&mut store, T0);
    let err = keeper
        .rate_proposal_with_zkp(&mut c, DOMAIN, "I", "S", 1, "00", &"0".repeat(64), "")
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
}

#[test]
fn big_purge_announces_once_then_wipes_anonymity_state() {
    let mut store = MemStore::new();
    domain_with(&mut store, &["alice"], 500_000);
    let keeper = Keeper::new();
    {
        let mut c = ctx(&mut store, T0);
        keeper.join_permission_register(&mut c, DOMAIN, "alice", &[9u8; 32]).unwrap();
        let commitment = fr_to_hex(&identity_commitment(&secrets()[0]));
        keeper
            .register_identity_commitment(&mut c, DOMAIN, "alice", &commitment)
            .unwrap();
        c.set(&keys::nullifier(DOMAIN, "ab"), &7i64.to_be_bytes());
        let schedule = keeper.get_purge_schedule(&c, DOMAIN).unwrap().unwrap();
        assert_eq!(schedule.next_purge_time, T0 + 90 * DAY);
    }
    {
        let mut c = ctx(&mut store, T0 + 83 * DAY);
        keeper.check_and_execute_big_purges(&mut c).unwrap();
        let announced: Vec<_> = c
            .events()
            .iter()
            .filter(|e| e.kind == events::BIG_PURGE_ANNOUNCEMENT)
            .collect();
        assert_eq!(announced.len(), 1);
        assert_eq!(announced[0].get("purge_time"), Some((T0 + 90 * DAY).to_string().as_str()));
        assert!(keeper.is_purge_announced(&c, DOMAIN));
    }
    {
        let mut c = ctx(&mut store, T0 + 84 * DAY);
        keeper.check_and_execute_big_purges(&mut c).unwrap();
        assert!(c.events().is_empty());
    }
    let mut c = ctx(&mut store, T0 + 90 * DAY);
    keeper.check_and_execute_big_purges(&mut c).unwrap();
    assert!(c.events().iter().any(|e| e.kind == events::BIG_PURGE_EXECUTED));

    let domain = keeper.require_domain(&c, DOMAIN).unwrap();
    assert!(domain.permission_register.is_empty());
    assert!(domain.identity_commitments.is_empty());
    assert!(domain.merkle_root.is_empty());
    assert!(domain.merkle_root_history.is_empty());
    assert_eq!(domain.members.len(), 2);
    assert_eq!(domain.treasury.pnyx_amount(), 500_000);
    assert!(!keeper.is_nullifier_used(&c, DOMAIN, "ab"));
    assert!(!keeper.is_purge_announced(&c, DOMAIN));
    let schedule = keeper.get_purge_schedule(&c, DOMAIN).unwrap().unwrap();
    assert_eq!(schedule.next_purge_time, T0 + 180 * DAY);
}

#[test]
fn purge_leaves_other_domains_nullifiers_alone() {
    let mut store = MemStore::new();
    domain_with(&mut store, &["a"], 500_000);
    let keeper = Keeper::new();
    let mut c = ctx(&mut store, T0);
    keeper.create_domain(&mut c, "Dx", ADMIN, Coins::pnyx(1_000)).unwrap();
    let spent = "11".repeat(32);
    for domain in [DOMAIN, "Dx"] {
        c.set(&keys::nullifier(domain, &spent), &1i64.to_be_bytes());
    }

    keeper.execute_big_purge(&mut c, DOMAIN).unwrap();
    assert!(!keeper.is_nullifier_used(&c, DOMAIN, &spent));
    assert!(keeper.is_nullifier_used(&c, "Dx", &spent));
}
