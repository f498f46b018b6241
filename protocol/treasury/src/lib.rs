//! Treasury economics: per-vote rewards, put prices, domain cost and the
//! supply-decayed interest schedules for validators and domains.
//!
//! Every formula is evaluated as a single exact fraction over `u128` and
//! truncated toward zero, so results match the integer reference bit for bit.

/// Domain-creation cost multiplier.
pub const C_DOM: u128 = 2;
/// Cap on the number of users that scale the put price.
pub const C_PUT: u128 = 15;
/// Treasury divisor for a single reward.
pub const C_EARN: u128 = 1_000;
/// Minimum validator stake; one unit of voting power.
pub const STAKE_MIN: u128 = 100_000;
/// Hard cap on released supply.
pub const SUPPLY_MAX: u128 = 21_000_000;
/// Julian year in seconds.
pub const SEC_PER_YEAR: i64 = 31_557_600;
/// Annual domain interest, percent.
pub const APY_DOM_PCT: u128 = 25;
/// Annual node staking yield, percent.
pub const APY_NODE_PCT: u128 = 10;

pub const DENOM: &str = "pnyx";

/// `treasury / C_EARN`.
pub fn reward(treasury: u128) -> u128 {
    treasury / C_EARN
}

/// `reward(treasury) · min(C_PUT, n_users)`.
pub fn put_price(treasury: u128, n_users: u64) -> u128 {
    let users = (n_users as u128).min(C_PUT);
    reward(treasury).saturating_mul(users)
}

/// `fee · C_DOM · C_EARN`.
pub fn domain_cost(fee: u128) -> u128 {
    fee.saturating_mul(C_DOM * C_EARN)
}

/// Numerator of `release_decay`; the denominator is `SUPPLY_MAX`.
pub fn unreleased_supply(total_release: u128) -> u128 {
    SUPPLY_MAX.saturating_sub(total_release)
}

/// `⌊principal · pct/100 · elapsed/SEC_PER_YEAR · (SUPPLY_MAX − release)/SUPPLY_MAX⌋`,
/// or `None` if an intermediate product leaves `u128`.
fn accrue(principal: u128, pct: u128, total_release: u128, elapsed: i64) -> Option<u128> {
    if principal == 0 || elapsed <= 0 {
        return Some(0);
    }
    let remaining = unreleased_supply(total_release);
    if remaining == 0 {
        return Some(0);
    }
    let numerator = principal
        .checked_mul(pct)?
        .checked_mul(elapsed as u128)?
        .checked_mul(remaining)?;
    let denominator = 100 * SEC_PER_YEAR as u128 * SUPPLY_MAX;
    Some(numerator / denominator)
}

/// Staking reward for `elapsed` seconds at `APY_NODE_PCT`, decayed by the
/// fraction of supply already released. `None` on arithmetic overflow.
pub fn node_reward(stake: u128, total_release: u128, elapsed: i64) -> Option<u128> {
    accrue(stake, APY_NODE_PCT, total_release, elapsed)
}

/// Domain interest at `APY_DOM_PCT`, capped by the payouts the domain made
/// since the last tick. Inactive domains (`payout == 0`) earn nothing.
pub fn domain_interest(treasury: u128, payout: u64, total_release: u128, elapsed: i64) -> u128 {
    if payout == 0 || treasury == 0 {
        return 0;
    }
    let cap = payout as u128;
    // An overflowing product is orders of magnitude above any u64 cap.
    match accrue(treasury, APY_DOM_PCT, total_release, elapsed) {
        Some(interest) => interest.min(cap),
        None => cap,
    }
}

/// Voting power for a stake: whole multiples of `STAKE_MIN`.
pub fn voting_power(stake: u128) -> i64 {
    i64::try_from(stake / STAKE_MIN).unwrap_or(i64::MAX)
}
