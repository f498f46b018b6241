use crate::params::DENOM;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    pub fn pnyx(amount: u128) -> Self {
        Self::new(DENOM, amount)
    }
}

/// Multi-denom bag kept sorted by denom with no zero entries, so equal bags
/// always encode to equal bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coins(Vec<Coin>);

impl Coins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pnyx(amount: u128) -> Self {
        let mut coins = Self::new();
        coins.add(&Coin::pnyx(amount));
        coins
    }

    /// Normalises arbitrary input: merges duplicate denoms and drops zeros.
    pub fn from_coins(coins: impl IntoIterator<Item = Coin>) -> Self {
        let mut out = Self::new();
        for coin in coins {
            out.add(&coin);
        }
        out
    }

    pub fn amount_of(&self, denom: &str) -> u128 {
        self.0
            .iter()
            .find(|c| c.denom == denom)
            .map(|c| c.amount)
            .unwrap_or(0)
    }

    pub fn pnyx_amount(&self) -> u128 {
        self.amount_of(DENOM)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.0.iter()
    }

    pub fn add(&mut self, coin: &Coin) {
        if coin.amount == 0 {
            return;
        }
        match self.0.binary_search_by(|c| c.denom.as_str().cmp(&coin.denom)) {
            Ok(idx) => self.0[idx].amount = self.0[idx].amount.saturating_add(coin.amount),
            Err(idx) => self.0.insert(idx, coin.clone()),
        }
    }

    /// `None` when the bag holds less than `coin`.
    pub fn checked_sub(&self, coin: &Coin) -> Option<Coins> {
        if coin.amount == 0 {
            return Some(self.clone());
        }
        let mut out = self.clone();
        let idx = out
            .0
            .binary_search_by(|c| c.denom.as_str().cmp(&coin.denom))
            .ok()?;
        let remaining = out.0[idx].amount.checked_sub(coin.amount)?;
        if remaining == 0 {
            out.0.remove(idx);
        } else {
            out.0[idx].amount = remaining;
        }
        Some(out)
    }

    pub fn set_pnyx(&mut self, amount: u128) {
        self.0.retain(|c| c.denom != DENOM);
        self.add(&Coin::pnyx(amount));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingMode {
    #[default]
    SimpleMajority,
    AbsoluteMajority,
    SystemicConsensing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainOptions {
    pub admin_electable: bool,
    pub open_join: bool,
    pub only_admin_issues: bool,
    pub coin_burn_required: bool,
    /// 0 means [`crate::params::DEFAULT_APPROVAL_BPS`].
    pub approval_threshold_bps: u64,
    /// Seconds; 0 means [`crate::params::DEFAULT_DWELL_SECS`].
    pub default_dwell_time: i64,
    pub abstention_allowed: bool,
    pub voting_mode: VotingMode,
}

impl Default for DomainOptions {
    fn default() -> Self {
        Self {
            admin_electable: true,
            open_join: false,
            only_admin_issues: false,
            coin_burn_required: false,
            approval_threshold_bps: 0,
            default_dwell_time: 0,
            abstention_allowed: false,
            voting_mode: VotingMode::SimpleMajority,
        }
    }
}

/// Lifecycle colour of a suggestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zone {
    #[default]
    #[serde(rename = "")]
    Unset,
    #[serde(rename = "green")]
    Green,
    #[serde(rename = "yellow")]
    Yellow,
    #[serde(rename = "red")]
    Red,
}

/// One anonymous rating. Exactly one of the two identifiers is populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub domain_pub_key_hex: String,
    pub nullifier_hex: String,
    pub value: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingSource<'a> {
    Signature { domain_pub_key_hex: &'a str },
    Zk { nullifier_hex: &'a str },
}

impl Rating {
    pub fn signed(domain_pub_key_hex: impl Into<String>, value: i32) -> Self {
        Self {
            domain_pub_key_hex: domain_pub_key_hex.into(),
            nullifier_hex: String::new(),
            value,
        }
    }

    pub fn zk(nullifier_hex: impl Into<String>, value: i32) -> Self {
        Self {
            domain_pub_key_hex: String::new(),
            nullifier_hex: nullifier_hex.into(),
            value,
        }
    }

    pub fn source(&self) -> RatingSource<'_> {
        if self.domain_pub_key_hex.is_empty() {
            RatingSource::Zk {
                nullifier_hex: &self.nullifier_hex,
            }
        } else {
            RatingSource::Signature {
                domain_pub_key_hex: &self.domain_pub_key_hex,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    pub creator: String,
    pub stones: u64,
    pub ratings: Vec<Rating>,
    pub color: Zone,
    /// Seconds; 0 inherits the domain default.
    pub dwell_time: i64,
    pub entered_yellow_at: i64,
    pub entered_red_at: i64,
    pub delete_votes: u64,
    pub creation_date: i64,
    pub external_link: String,
}

impl Suggestion {
    pub fn new(name: impl Into<String>, creator: impl Into<String>, now: i64) -> Self {
        Self {
            name: name.into(),
            creator: creator.into(),
            stones: 0,
            ratings: Vec::new(),
            color: Zone::Unset,
            dwell_time: 0,
            entered_yellow_at: 0,
            entered_red_at: 0,
            delete_votes: 0,
            creation_date: now,
            external_link: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub name: String,
    pub stones: u64,
    pub suggestions: Vec<Suggestion>,
    pub creation_date: i64,
    pub last_activity_at: i64,
    pub external_link: String,
}

impl Issue {
    pub fn new(name: impl Into<String>, now: i64) -> Self {
        Self {
            name: name.into(),
            stones: 0,
            suggestions: Vec::new(),
            creation_date: now,
            last_activity_at: now,
            external_link: String::new(),
        }
    }

    pub fn suggestion_index(&self, name: &str) -> Option<usize> {
        self.suggestions.iter().position(|s| s.name == name)
    }

    pub fn suggestion(&self, name: &str) -> Option<&Suggestion> {
        self.suggestions.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    pub admin: String,
    pub members: Vec<String>,
    pub treasury: Coins,
    pub issues: Vec<Issue>,
    pub options: DomainOptions,
    pub permission_register: Vec<String>,
    pub identity_commitments: Vec<String>,
    pub merkle_root: String,
    pub merkle_root_history: Vec<String>,
    pub total_payouts: u64,
    pub transferred_stake: u64,
}

impl Domain {
    pub fn new(name: impl Into<String>, admin: impl Into<String>, treasury: Coins) -> Self {
        let admin = admin.into();
        Self {
            name: name.into(),
            members: vec![admin.clone()],
            admin,
            treasury,
            issues: Vec::new(),
            options: DomainOptions::default(),
            permission_register: Vec::new(),
            identity_commitments: Vec::new(),
            merkle_root: String::new(),
            merkle_root_history: Vec::new(),
            total_payouts: 0,
            transferred_stake: 0,
        }
    }

    pub fn is_member(&self, addr: &str) -> bool {
        self.members.iter().any(|m| m == addr)
    }

    pub fn issue_index(&self, name: &str) -> Option<usize> {
        self.issues.iter().position(|i| i.name == name)
    }

    pub fn issue(&self, name: &str) -> Option<&Issue> {
        self.issues.iter().find(|i| i.name == name)
    }

    /// Indices of `(issue, suggestion)` if both exist.
    pub fn locate(&self, issue: &str, suggestion: &str) -> Option<(usize, usize)> {
        let i = self.issue_index(issue)?;
        let s = self.issues[i].suggestion_index(suggestion)?;
        Some((i, s))
    }

    /// Deducts `reward(treasury)` and books it as a payout. Returns the
    /// amount, 0 when the treasury is too small to pay anything.
    pub fn pay_reward(&mut self) -> u128 {
        let amount = treasury::reward(self.treasury.pnyx_amount());
        if amount == 0 {
            return 0;
        }
        let Some(rest) = self.treasury.checked_sub(&Coin::pnyx(amount)) else {
            return 0;
        };
        self.treasury = rest;
        self.total_payouts = self
            .total_payouts
            .saturating_add(u64::try_from(amount).unwrap_or(u64::MAX));
        amount
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub operator_addr: String,
    #[serde(with = "hex::serde")]
    pub pub_key: Vec<u8>,
    pub stake: Coins,
    pub domains: Vec<String>,
    pub power: i64,
    pub jailed: bool,
    pub jailed_until: i64,
    pub missed_blocks: u64,
}

impl Validator {
    /// Power after a stake change: whole `STAKE_MIN` units, 0 while jailed.
    pub fn refresh_power(&mut self) {
        self.power = if self.jailed {
            0
        } else {
            treasury::voting_power(self.stake.pnyx_amount())
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BigPurgeSchedule {
    pub domain_name: String,
    pub next_purge_time: i64,
    pub purge_interval: i64,
    pub announcement_lead: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnboardingStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingRequest {
    pub domain: String,
    pub requester: String,
    pub domain_pub_key_hex: String,
    pub requested_at: i64,
    pub status: OnboardingStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    Approve,
    Abstain,
}

impl VoteChoice {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Approve),
            1 => Some(Self::Abstain),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionResult {
    /// Empty when nobody received a vote.
    pub candidate: String,
    pub votes: u64,
    pub total: u64,
    pub abstained: u64,
    pub elected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRank {
    pub member: String,
    pub stones: u64,
}

/// Entry of the list handed to the consensus engine after each block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    #[serde(with = "hex::serde")]
    pub pub_key: Vec<u8>,
    pub power: i64,
}

/// Misbehaviour reported by the consensus engine at the start of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Evidence {
    Downtime {
        #[serde(with = "hex::serde")]
        pub_key: Vec<u8>,
    },
    DoubleSign {
        #[serde(with = "hex::serde")]
        pub_key: Vec<u8>,
    },
}
