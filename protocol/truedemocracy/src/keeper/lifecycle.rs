use super::Keeper;
use crate::context::Ctx;
use crate::error::{Error, Result};
use crate::events::{self, Event};
use crate::keys;
use crate::params::{BPS_DENOMINATOR, DEFAULT_APPROVAL_BPS, DEFAULT_DWELL_SECS, DELETE_MAJORITY_BPS};
use crate::types::{DomainOptions, Suggestion, Zone};
use tracing::info;

/// `stones · 10000 ≥ members · bps`. An empty domain approves nothing.
pub fn meets_approval_threshold(stones: u64, members: usize, threshold_bps: u64) -> bool {
    if members == 0 {
        return false;
    }
    (stones as u128) * (BPS_DENOMINATOR as u128) >= (members as u128) * (threshold_bps as u128)
}

pub fn effective_threshold(options: &DomainOptions) -> u64 {
    if options.approval_threshold_bps > 0 {
        options.approval_threshold_bps
    } else {
        DEFAULT_APPROVAL_BPS
    }
}

pub fn effective_dwell_time(suggestion: &Suggestion, options: &DomainOptions) -> i64 {
    if suggestion.dwell_time > 0 {
        suggestion.dwell_time
    } else if options.default_dwell_time > 0 {
        options.default_dwell_time
    } else {
        DEFAULT_DWELL_SECS
    }
}

/// Next state of one suggestion at `now`; `None` means delete it.
fn advance(
    mut s: Suggestion,
    members: usize,
    options: &DomainOptions,
    now: i64,
) -> Option<Suggestion> {
    if meets_approval_threshold(s.stones, members, effective_threshold(options)) {
        s.color = Zone::Green;
        s.entered_yellow_at = 0;
        s.entered_red_at = 0;
        return Some(s);
    }
    let dwell = effective_dwell_time(&s, options);
    match s.color {
        Zone::Unset | Zone::Green => {
            s.color = Zone::Yellow;
            s.entered_yellow_at = now;
            s.entered_red_at = 0;
            Some(s)
        }
        Zone::Yellow => {
            if now >= s.entered_yellow_at.saturating_add(dwell) {
                s.color = Zone::Red;
                s.entered_red_at = now;
            }
            Some(s)
        }
        Zone::Red => {
            if now >= s.entered_red_at.saturating_add(dwell) {
                None
            } else {
                Some(s)
            }
        }
    }
}

impl Keeper {
    /// Drops the stone and delete-vote rows that point at a removed
    /// suggestion.
    pub(crate) fn forget_suggestion(
        &self,
        ctx: &mut Ctx<'_>,
        domain: &str,
        issue: &str,
        suggestion: &str,
    ) {
        for (key, value) in ctx.scan(&keys::suggestion_stone_prefix(domain, issue)) {
            if value == suggestion.as_bytes() {
                ctx.delete(&key);
            }
        }
        ctx.delete_prefix(&keys::delete_vote_prefix(domain, issue, suggestion));
    }

    /// One lifecycle pass over every suggestion of `domain_name`.
    pub fn evaluate_suggestion_zones(&self, ctx: &mut Ctx<'_>, domain_name: &str) -> Result<()> {
        let Some(mut domain) = self.get_domain(ctx, domain_name)? else {
            return Ok(());
        };
        let now = ctx.block_time();
        let members = domain.members.len();
        let options = domain.options.clone();
        let original = domain.issues.clone();
        let mut removed = Vec::new();

        for issue in domain.issues.iter_mut() {
            let current = std::mem::take(&mut issue.suggestions);
            for suggestion in current {
                let name = suggestion.name.clone();
                match advance(suggestion, members, &options, now) {
                    Some(next) => issue.suggestions.push(next),
                    None => removed.push((issue.name.clone(), name)),
                }
            }
        }

        if domain.issues == original {
            return Ok(());
        }
        self.set_domain(ctx, &domain)?;
        for (issue, suggestion) in removed {
            self.forget_suggestion(ctx, domain_name, &issue, &suggestion);
            info!("suggestion {}/{}/{} expired in red zone", domain_name, issue, suggestion);
        }
        Ok(())
    }

    pub fn process_all_lifecycles(&self, ctx: &mut Ctx<'_>) -> Result<()> {
        for name in self.domain_names(ctx) {
            self.evaluate_suggestion_zones(ctx, &name)?;
        }
        Ok(())
    }

    /// Fast delete by 2/3 of members. Returns whether the suggestion went.
    pub fn vote_to_delete(
        &self,
        ctx: &mut Ctx<'_>,
        domain_name: &str,
        issue: &str,
        suggestion: &str,
        member: &str,
    ) -> Result<bool> {
        let mut domain = self.require_domain(ctx, domain_name)?;
        if !domain.is_member(member) {
            return Err(Error::unauthorized("only domain members can vote to delete"));
        }
        let (i, s) = domain
            .locate(issue, suggestion)
            .ok_or_else(|| Error::unknown("issue or suggestion not found"))?;
        let vote_key = keys::delete_vote(domain_name, issue, suggestion, member);
        if ctx.has(&vote_key) {
            return Err(Error::invalid("already voted to delete this suggestion"));
        }
        ctx.set(&vote_key, &[1]);

        let target = &mut domain.issues[i].suggestions[s];
        target.delete_votes += 1;
        let votes = target.delete_votes as u128;
        let deleted = votes * BPS_DENOMINATOR as u128
            >= domain.members.len() as u128 * DELETE_MAJORITY_BPS as u128;
        if deleted {
            domain.issues[i].suggestions.remove(s);
        }
        self.set_domain(ctx, &domain)?;
        if deleted {
            self.forget_suggestion(ctx, domain_name, issue, suggestion);
            info!("suggestion {}/{}/{} deleted by vote", domain_name, issue, suggestion);
        }
        ctx.emit(
            Event::new(events::VOTE_DELETE)
                .attr("domain", domain_name)
                .attr("issue", issue)
                .attr("suggestion", suggestion)
                .attr("deleted", deleted),
        );
        Ok(deleted)
    }
}
