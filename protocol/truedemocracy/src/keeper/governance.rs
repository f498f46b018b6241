use super::Keeper;
use crate::context::Ctx;
use crate::error::{Error, Result};
use crate::events::{self, Event};
use crate::keys;
use crate::params::{BPS_DENOMINATOR, EXCLUDE_MAJORITY_BPS, INACTIVITY_TIMEOUT};
use crate::types::{Domain, MemberRank};
use tracing::info;

impl Keeper {
    /// Stones each member holds on the member list, in member order.
    pub fn member_stone_counts(&self, ctx: &Ctx<'_>, domain: &Domain) -> Vec<MemberRank> {
        let mut ranks: Vec<MemberRank> = domain
            .members
            .iter()
            .map(|m| MemberRank {
                member: m.clone(),
                stones: 0,
            })
            .collect();
        for (_, target) in ctx.scan(&keys::member_stone_prefix(&domain.name)) {
            let rank = ranks.iter_mut().find(|r| r.member.as_bytes() == target.as_slice());
            if let Some(rank) = rank {
                rank.stones += 1;
            }
        }
        ranks
    }

    pub fn place_stone_on_member(
        &self,
        ctx: &mut Ctx<'_>,
        domain_name: &str,
        target: &str,
        voter: &str,
    ) -> Result<()> {
        let domain = self.require_domain(ctx, domain_name)?;
        if !domain.is_member(voter) {
            return Err(Error::unauthorized("only domain members can vote for members"));
        }
        if !domain.is_member(target) {
            return Err(Error::unknown("target is not a member of the domain"));
        }
        if voter == target {
            return Err(Error::invalid("cannot place a stone on yourself"));
        }
        let key = keys::member_stone(domain_name, voter);
        if ctx.get(&key).as_deref() == Some(target.as_bytes()) {
            return Err(Error::invalid("stone already placed on this member"));
        }
        ctx.set(&key, target.as_bytes());
        ctx.emit(
            Event::new(events::PLACE_STONE_MEMBER)
                .attr("domain", domain_name)
                .attr("member", target)
                .attr("voter", voter),
        );
        Ok(())
    }

    /// Hands the admin role to the member with most stones. Ties go to the
    /// earlier member in the list.
    pub fn elect_admin(&self, ctx: &mut Ctx<'_>, domain_name: &str) -> Result<()> {
        let Some(mut domain) = self.get_domain(ctx, domain_name)? else {
            return Ok(());
        };
        if !domain.options.admin_electable {
            return Ok(());
        }
        let mut leader: Option<MemberRank> = None;
        for rank in self.member_stone_counts(ctx, &domain) {
            if rank.stones > leader.as_ref().map_or(0, |l| l.stones) {
                leader = Some(rank);
            }
        }
        let Some(leader) = leader else {
            return Ok(());
        };
        if leader.member == domain.admin {
            return Ok(());
        }
        info!(
            "domain {} admin changed from {} to {} ({} stones)",
            domain_name, domain.admin, leader.member, leader.stones
        );
        domain.admin = leader.member;
        self.set_domain(ctx, &domain)
    }

    /// Records an exclusion vote and removes the target once 2/3 of the
    /// other members agree. Returns whether the target was excluded.
    pub fn vote_to_exclude(
        &self,
        ctx: &mut Ctx<'_>,
        domain_name: &str,
        target: &str,
        voter: &str,
    ) -> Result<bool> {
        let mut domain = self.require_domain(ctx, domain_name)?;
        if !domain.is_member(voter) {
            return Err(Error::unauthorized("only domain members can vote to exclude"));
        }
        if !domain.is_member(target) {
            return Err(Error::unknown("target is not a member of the domain"));
        }
        if voter == target {
            return Err(Error::invalid("cannot vote to exclude yourself"));
        }
        let vote_key = keys::exclude_vote(domain_name, target, voter);
        if ctx.has(&vote_key) {
            return Err(Error::invalid("already voted to exclude this member"));
        }
        ctx.set(&vote_key, &[1]);

        // Only ballots of current members count; rows left by departed
        // voters are ignored.
        let votes = domain
            .members
            .iter()
            .filter(|m| *m != target && ctx.has(&keys::exclude_vote(domain_name, target, m)))
            .count() as u128;
        let others = domain.members.len().saturating_sub(1) as u128;
        let excluded = votes * BPS_DENOMINATOR as u128 >= others * EXCLUDE_MAJORITY_BPS as u128;
        if excluded {
            domain.members.retain(|m| m != target);
            self.release_member_stones(ctx, &mut domain, target);
            self.set_domain(ctx, &domain)?;
            ctx.delete_prefix(&keys::exclude_vote_prefix(domain_name, target));
            self.forget_exclude_votes_by(ctx, domain_name, target);
            info!("member {} excluded from {} with {} votes", target, domain_name, votes);
        }
        ctx.emit(
            Event::new(events::VOTE_EXCLUDE)
                .attr("domain", domain_name)
                .attr("target", target)
                .attr("excluded", excluded),
        );
        Ok(excluded)
    }

    /// Drops the exclusion ballots `voter` cast against other members.
    fn forget_exclude_votes_by(&self, ctx: &mut Ctx<'_>, domain_name: &str, voter: &str) {
        let prefix = keys::exclude_vote_domain_prefix(domain_name);
        for (key, _) in ctx.scan(&prefix) {
            let cast_by_voter = std::str::from_utf8(&key[prefix.len()..])
                .ok()
                .and_then(|rest| rest.split_once(keys::SEPARATOR))
                .is_some_and(|(_, by)| by == voter);
            if cast_by_voter {
                ctx.delete(&key);
            }
        }
    }

    /// Takes back every stone `member` placed in the domain.
    fn release_member_stones(&self, ctx: &mut Ctx<'_>, domain: &mut Domain, member: &str) {
        let issue_key = keys::issue_stone(&domain.name, member);
        if let Some(issue) = ctx.get(&issue_key) {
            let held = domain.issues.iter_mut().find(|i| i.name.as_bytes() == issue.as_slice());
            if let Some(i) = held {
                i.stones = i.stones.saturating_sub(1);
            }
            ctx.delete(&issue_key);
        }
        for issue in domain.issues.iter_mut() {
            let key = keys::suggestion_stone(&domain.name, &issue.name, member);
            let Some(target) = ctx.get(&key) else {
                continue;
            };
            if let Some(s) = issue
                .suggestions
                .iter_mut()
                .find(|s| s.name.as_bytes() == target.as_slice())
            {
                s.stones = s.stones.saturating_sub(1);
            }
            ctx.delete(&key);
        }
        ctx.delete(&keys::member_stone(&domain.name, member));
    }

    /// Reaps issues idle for longer than the inactivity timeout.
    pub fn cleanup_inactive_issues(&self, ctx: &mut Ctx<'_>, domain_name: &str) -> Result<()> {
        let Some(mut domain) = self.get_domain(ctx, domain_name)? else {
            return Ok(());
        };
        let now = ctx.block_time();
        let (stale, kept): (Vec<_>, Vec<_>) = domain.issues.into_iter().partition(|issue| {
            let last = if issue.last_activity_at > 0 {
                issue.last_activity_at
            } else {
                issue.creation_date
            };
            last > 0 && now - last > INACTIVITY_TIMEOUT
        });
        domain.issues = kept;
        if stale.is_empty() {
            return Ok(());
        }
        self.set_domain(ctx, &domain)?;
        for issue in stale {
            for (key, value) in ctx.scan(&keys::issue_stone_prefix(domain_name)) {
                if value == issue.name.as_bytes() {
                    ctx.delete(&key);
                }
            }
            ctx.delete_prefix(&keys::suggestion_stone_prefix(domain_name, &issue.name));
            ctx.delete_prefix(&keys::election_vote_prefix(domain_name, &issue.name));
            for suggestion in &issue.suggestions {
                let ballots = keys::delete_vote_prefix(domain_name, &issue.name, &suggestion.name);
                ctx.delete_prefix(&ballots);
            }
            info!("issue {}/{} removed after inactivity", domain_name, issue.name);
        }
        Ok(())
    }
}
