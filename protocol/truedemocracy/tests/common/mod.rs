#![allow(dead_code)]

use state::MemStore;
use truedemocracy::{Coins, Ctx, Issue, Keeper, Suggestion};

pub const T0: i64 = 1_700_000_000;
pub const DOMAIN: &str = "D";
pub const ADMIN: &str = "admin";

pub fn ctx(store: &mut MemStore, time: i64) -> Ctx<'_> {
    Ctx::new(store, time, 1)
}

/// `ADMIN` plus `members`, treasury in pnyx.
pub fn domain_with(store: &mut MemStore, members: &[&str], treasury: u128) {
    let keeper = Keeper::new();
    let mut c = ctx(store, T0);
    keeper
        .create_domain(&mut c, DOMAIN, ADMIN, Coins::pnyx(treasury))
        .unwrap();
    for member in members {
        keeper.add_member(&mut c, DOMAIN, member, ADMIN).unwrap();
    }
}

/// Inserts an issue straight into the domain, bypassing the put price.
pub fn seed_issue(store: &mut MemStore, issue: &str, suggestions: &[&str]) {
    let keeper = Keeper::new();
    let mut c = ctx(store, T0);
    let mut domain = keeper.require_domain(&c, DOMAIN).unwrap();
    let mut seeded = Issue::new(issue, T0);
    for name in suggestions {
        seeded.suggestions.push(Suggestion::new(*name, ADMIN, T0));
    }
    domain.issues.push(seeded);
    keeper.set_domain(&mut c, &domain).unwrap();
}

/// `m1..=m{n}`.
pub fn member_names(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("m{i}")).collect()
}
