//! Protocol constants. These are part of the wire contract; changing any of
//! them forks the chain.

pub use treasury::{DENOM, STAKE_MIN};

pub const MODULE_NAME: &str = "truedemocracy";

pub const STAKE_TRANSFER_LIMIT_BPS: u128 = 1_000;
pub const DEFAULT_APPROVAL_BPS: u64 = 500;
pub const DEFAULT_DWELL_SECS: i64 = 86_400;
pub const DELETE_MAJORITY_BPS: u64 = 6_667;
pub const EXCLUDE_MAJORITY_BPS: u64 = 6_667;
pub const BPS_DENOMINATOR: u64 = 10_000;

/// 360 days.
pub const INACTIVITY_TIMEOUT: i64 = 31_104_000;
/// 90 days.
pub const DEFAULT_PURGE_INTERVAL: i64 = 7_776_000;
/// 7 days.
pub const DEFAULT_ANNOUNCEMENT_LEAD: i64 = 604_800;

pub const REWARD_INTERVAL: i64 = 3_600;

pub const MERKLE_ROOT_HISTORY_SIZE: usize = 10;

pub const SIGNED_BLOCKS_WINDOW: u64 = 100;
pub const MIN_SIGNED_PER_WINDOW: u64 = 50;
/// Percent of stake.
pub const SLASH_FRACTION_DOWNTIME: u128 = 1;
/// Percent of stake.
pub const SLASH_FRACTION_DOUBLE_SIGN: u128 = 5;
pub const DOWNTIME_JAIL_DURATION: i64 = 600;

pub const RATING_MIN: i32 = -5;
pub const RATING_MAX: i32 = 5;

/// Stored in place of a candidate name for an abstention.
pub const ABSTAIN: &str = "ABSTAIN";

pub const PUB_KEY_LEN: usize = 32;
