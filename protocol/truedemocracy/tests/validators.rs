mod common;

use common::{ctx, domain_with, seed_issue, ADMIN, DOMAIN, T0};
use ed25519_dalek::SigningKey;
use state::MemStore;
use truedemocracy::params::{DOWNTIME_JAIL_DURATION, REWARD_INTERVAL, STAKE_MIN};
use truedemocracy::{Coins, Error, Evidence, Keeper};

fn op_key() -> Vec<u8> {
    SigningKey::from_bytes(&[7u8; 32]).verifying_key().to_bytes().to_vec()
}

/// Domain with member `op` registered as a validator bonding `stake`.
fn validator_setup(store: &mut MemStore, stake: u128) {
    domain_with(store, &["op"], 500_000);
    let keeper = Keeper::new();
    let mut c = ctx(store, T0);
    keeper
        .register_validator(&mut c, "op", &op_key(), Coins::pnyx(stake), DOMAIN)
        .unwrap();
}

/// Books one reward payout (500 at a 500k treasury) for the domain.
fn earn_payout(store: &mut MemStore) {
    seed_issue(store, "I", &[]);
    let keeper = Keeper::new();
    let mut c = ctx(store, T0);
    keeper.place_stone_on_issue(&mut c, DOMAIN, "I", ADMIN).unwrap();
}

#[test]
fn registration_checks_key_stake_and_membership() {
    let mut store = MemStore::new();
    domain_with(&mut store, &["op", "other"], 500_000);
    let keeper = Keeper::new();
    let mut c = ctx(&mut store, T0);
    let key = op_key();

    let err = keeper
        .register_validator(&mut c, "op", &key[..31], Coins::pnyx(STAKE_MIN), DOMAIN)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
    let err = keeper
        .register_validator(&mut c, "op", &key, Coins::pnyx(STAKE_MIN - 1), DOMAIN)
        .unwrap_err();
    assert!(matches!(err, Error::InsufficientFunds(_)));
    let err = keeper
        .register_validator(&mut c, "op", &key, Coins::pnyx(STAKE_MIN), "Nowhere")
        .unwrap_err();
    assert!(matches!(err, Error::UnknownRequest(_)));
    let err = keeper
        .register_validator(&mut c, "mallory", &key, Coins::pnyx(STAKE_MIN), DOMAIN)
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));

    let validator = keeper
        .register_validator(&mut c, "op", &key, Coins::pnyx(2 * STAKE_MIN + 5), DOMAIN)
        .unwrap();
    assert_eq!(validator.power, 2);
    assert_eq!(validator.domains, vec![DOMAIN.to_string()]);

    let err = keeper
        .register_validator(&mut c, "op", &[1u8; 32], Coins::pnyx(STAKE_MIN), DOMAIN)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
    let err = keeper
        .register_validator(&mut c, "other", &key, Coins::pnyx(STAKE_MIN), DOMAIN)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));

    let by_key = keeper.get_validator_by_pub_key(&c, &key).unwrap().unwrap();
    assert_eq!(by_key.operator_addr, "op");
}

#[test]
fn fifty_misses_are_tolerated_the_fifty_first_jails() {
    let mut store = MemStore::new();
    validator_setup(&mut store, 100_000);
    let keeper = Keeper::new();
    let mut c = ctx(&mut store, T0);

    for _ in 0..50 {
        keeper.handle_downtime(&mut c, &op_key()).unwrap();
    }
    let validator = keeper.get_validator(&c, "op").unwrap().unwrap();
    assert!(!validator.jailed);
    assert_eq!(validator.missed_blocks, 50);

    keeper.handle_downtime(&mut c, &op_key()).unwrap();
    let validator = keeper.get_validator(&c, "op").unwrap().unwrap();
    assert!(validator.jailed);
    assert_eq!(validator.missed_blocks, 0);
    assert_eq!(validator.stake.pnyx_amount(), 99_000);
    assert_eq!(validator.jailed_until, T0 + DOWNTIME_JAIL_DURATION);
    assert_eq!(validator.power, 0);

    // Misses while jailed are not counted.
    keeper.handle_downtime(&mut c, &op_key()).unwrap();
    let validator = keeper.get_validator(&c, "op").unwrap().unwrap();
    assert_eq!(validator.missed_blocks, 0);
    assert_eq!(validator.stake.pnyx_amount(), 99_000);
}

#[test]
fn double_sign_at_minimum_stake_leaves_validator_unable_to_unjail() {
    let mut store = MemStore::new();
    validator_setup(&mut store, STAKE_MIN);
    let keeper = Keeper::new();
    {
        let mut c = ctx(&mut store, T0);
        keeper
            .handle_evidence(&mut c, &Evidence::DoubleSign { pub_key: op_key() })
            .unwrap();
        let validator = keeper.get_validator(&c, "op").unwrap().unwrap();
        assert_eq!(validator.stake.pnyx_amount(), 95_000);
        assert_eq!(validator.jailed_until, T0 + 10 * DOWNTIME_JAIL_DURATION);
        let updates = keeper.build_validator_updates(&c).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].power, 0);

        let err = keeper.unjail(&mut c, "op").unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }
    let mut c = ctx(&mut store, T0 + 10 * DOWNTIME_JAIL_DURATION);
    let err = keeper.unjail(&mut c, "op").unwrap_err();
    assert!(matches!(err, Error::InsufficientFunds(_)));
}

#[test]
fn unjail_restores_power_after_the_jail_time() {
    let mut store = MemStore::new();
    validator_setup(&mut store, 3 * STAKE_MIN);
    let keeper = Keeper::new();
    {
        let mut c = ctx(&mut store, T0);
        keeper.handle_double_sign(&mut c, &op_key()).unwrap();
        let err = keeper.unjail(&mut c, "op").unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }
    let mut c = ctx(&mut store, T0 + 10 * DOWNTIME_JAIL_DURATION);
    keeper.unjail(&mut c, "op").unwrap();
    let validator = keeper.get_validator(&c, "op").unwrap().unwrap();
    assert!(!validator.jailed);
    assert_eq!(validator.stake.pnyx_amount(), 285_000);
    assert_eq!(validator.power, 2);

    let err = keeper.unjail(&mut c, "op").unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
}

#[test]
fn evidence_for_unknown_keys_is_ignored() {
    let mut store = MemStore::new();
    validator_setup(&mut store, STAKE_MIN);
    let keeper = Keeper::new();
    let mut c = ctx(&mut store, T0);
    keeper
        .begin_block(
            &mut c,
            &[
                Evidence::Downtime { pub_key: vec![9u8; 32] },
                Evidence::DoubleSign { pub_key: vec![9u8; 32] },
            ],
        )
        .unwrap();
    assert!(!keeper.get_validator(&c, "op").unwrap().unwrap().jailed);
}

#[test]
fn withdrawals_are_capped_at_a_tenth_of_payouts() {
    let mut store = MemStore::new();
    validator_setup(&mut store, 2 * STAKE_MIN);
    let keeper = Keeper::new();
    {
        let mut c = ctx(&mut store, T0);
        let err = keeper.withdraw_stake(&mut c, "op", 10).unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds(_)));
    }
    earn_payout(&mut store);
    let mut c = ctx(&mut store, T0);

    let err = keeper.withdraw_stake(&mut c, "op", 51).unwrap_err();
    assert!(matches!(err, Error::InsufficientFunds(_)));
    let released = keeper.withdraw_stake(&mut c, "op", 50).unwrap();
    assert_eq!(released, Coins::pnyx(50));
    assert_eq!(
        keeper.get_validator(&c, "op").unwrap().unwrap().stake.pnyx_amount(),
        2 * STAKE_MIN - 50
    );
    assert_eq!(keeper.require_domain(&c, DOMAIN).unwrap().transferred_stake, 50);

    let err = keeper.withdraw_stake(&mut c, "op", 1).unwrap_err();
    assert!(matches!(err, Error::InsufficientFunds(_)));
}

#[test]
fn withdrawing_below_minimum_removes_the_validator() {
    let mut store = MemStore::new();
    validator_setup(&mut store, STAKE_MIN);
    earn_payout(&mut store);
    let keeper = Keeper::new();
    let mut c = ctx(&mut store, T0);

    let released = keeper.withdraw_stake(&mut c, "op", 20).unwrap();
    assert_eq!(released, Coins::pnyx(STAKE_MIN));
    assert!(keeper.get_validator(&c, "op").unwrap().is_none());
    assert!(keeper.get_validator_by_pub_key(&c, &op_key()).unwrap().is_none());
}

#[test]
fn validators_leaving_their_domain_are_dropped() {
    let mut store = MemStore::new();
    validator_setup(&mut store, STAKE_MIN);
    let keeper = Keeper::new();
    let mut c = ctx(&mut store, T0);

    keeper.enforce_validator_set(&mut c).unwrap();
    assert!(keeper.get_validator(&c, "op").unwrap().is_some());

    let mut domain = keeper.require_domain(&c, DOMAIN).unwrap();
    domain.members.retain(|m| m != "op");
    keeper.set_domain(&mut c, &domain).unwrap();
    keeper.enforce_validator_set(&mut c).unwrap();
    assert!(keeper.get_validator(&c, "op").unwrap().is_none());
    assert!(keeper.build_validator_updates(&c).unwrap().is_empty());
}

#[test]
fn staking_rewards_accrue_hourly_into_stake() {
    let mut store = MemStore::new();
    validator_setup(&mut store, STAKE_MIN);
    let keeper = Keeper::new();
    {
        let mut c = ctx(&mut store, T0);
        keeper.init_reward_state(&mut c).unwrap();
    }
    {
        let mut c = ctx(&mut store, T0 + REWARD_INTERVAL - 1);
        keeper.distribute_staking_rewards(&mut c).unwrap();
        assert_eq!(keeper.total_release(&c).unwrap(), 0);
    }
    let mut c = ctx(&mut store, T0 + REWARD_INTERVAL);
    keeper.distribute_staking_rewards(&mut c).unwrap();
    // 100000 · 10% · 3600 / 31557600 rounds down to 1.
    let validator = keeper.get_validator(&c, "op").unwrap().unwrap();
    assert_eq!(validator.stake.pnyx_amount(), STAKE_MIN + 1);
    assert_eq!(keeper.total_release(&c).unwrap(), 1);
}

#[test]
fn jailed_validators_earn_nothing() {
    let mut store = MemStore::new();
    validator_setup(&mut store, 10 * STAKE_MIN);
    let keeper = Keeper::new();
    let mut c = ctx(&mut store, T0);
    keeper.init_reward_state(&mut c).unwrap();
    keeper.handle_double_sign(&mut c, &op_key()).unwrap();
    drop(c);

    let mut c = ctx(&mut store, T0 + 10 * REWARD_INTERVAL);
    keeper.distribute_staking_rewards(&mut c).unwrap();
    assert_eq!(
        keeper.get_validator(&c, "op").unwrap().unwrap().stake.pnyx_amount(),
        950_000
    );
    assert_eq!(keeper.total_release(&c).unwrap(), 0);
}

#[test]
fn domain_interest_is_capped_by_fresh_payouts() {
    let mut store = MemStore::new();
    domain_with(&mut store, &[], 500_000);
    earn_payout(&mut store);
    let keeper = Keeper::new();
    {
        let mut c = ctx(&mut store, T0);
        keeper.init_reward_state(&mut c).unwrap();
    }
    {
        let mut c = ctx(&mut store, T0 + REWARD_INTERVAL);
        keeper.distribute_domain_interest(&mut c).unwrap();
        // 499500 · 25% · 3600 / 31557600 = 14.2...
        let domain = keeper.require_domain(&c, DOMAIN).unwrap();
        assert_eq!(domain.treasury.pnyx_amount(), 499_514);
    }
    let mut c = ctx(&mut store, T0 + 2 * REWARD_INTERVAL);
    keeper.distribute_domain_interest(&mut c).unwrap();
    assert_eq!(keeper.require_domain(&c, DOMAIN).unwrap().treasury.pnyx_amount(), 499_514);
}
