mod common;

use common::{ctx, domain_with, seed_issue, DOMAIN, T0};
use proptest::prelude::*;
use state::MemStore;
use truedemocracy::keeper::{meets_approval_threshold, sort_issues_by_stones};
use truedemocracy::{Issue, Keeper};

const MEMBERS: [&str; 4] = ["m1", "m2", "m3", "m4"];
const ISSUES: [&str; 3] = ["I1", "I2", "I3"];

proptest! {
    #[test]
    fn every_member_holds_at_most_one_issue_stone(
        moves in proptest::collection::vec((0usize..4, 0usize..3), 1..40)
    ) {
        let mut store = MemStore::new();
        domain_with(&mut store, &MEMBERS, 1_000_000);
        for issue in ISSUES {
            seed_issue(&mut store, issue, &[]);
        }
        let keeper = Keeper::new();
        let mut c = ctx(&mut store, T0);
        for (member, issue) in moves {
            // Re-placing on the same issue is rejected and changes nothing.
            let _ = keeper.place_stone_on_issue(&mut c, DOMAIN, ISSUES[issue], MEMBERS[member]);
        }

        let domain = keeper.require_domain(&c, DOMAIN).unwrap();
        for issue in &domain.issues {
            let holders = MEMBERS
                .iter()
                .filter(|m| {
                    keeper.member_issue_stone(&c, DOMAIN, m).as_deref() == Some(issue.name.as_str())
                })
                .count() as u64;
            prop_assert_eq!(issue.stones, holders);
        }
        let placed = MEMBERS
            .iter()
            .filter(|m| keeper.member_issue_stone(&c, DOMAIN, m).is_some())
            .count() as u64;
        prop_assert_eq!(domain.issues.iter().map(|i| i.stones).sum::<u64>(), placed);
    }

    #[test]
    fn approval_is_monotonic_in_stones(
        stones in 0u64..1_000,
        members in 1usize..1_000,
        bps in 0u64..=10_000
    ) {
        if meets_approval_threshold(stones, members, bps) {
            prop_assert!(meets_approval_threshold(stones + 1, members, bps));
        }
        prop_assert!(meets_approval_threshold(members as u64, members, bps));
    }

    #[test]
    fn issue_ordering_is_stones_desc_then_oldest_first(
        entries in proptest::collection::vec((0u64..5, 0i64..100), 0..20)
    ) {
        let issues: Vec<Issue> = entries
            .iter()
            .enumerate()
            .map(|(n, (stones, created))| {
                let mut issue = Issue::new(format!("i{n}"), *created);
                issue.stones = *stones;
                issue
            })
            .collect();
        let sorted = sort_issues_by_stones(&issues);
        prop_assert_eq!(sorted.len(), issues.len());
        for pair in sorted.windows(2) {
            prop_assert!(
                pair[0].stones > pair[1].stones
                    || (pair[0].stones == pair[1].stones
                        && pair[0].creation_date <= pair[1].creation_date)
            );
        }
    }
}
