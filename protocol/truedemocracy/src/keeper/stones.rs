use super::Keeper;
use crate::context::Ctx;
use crate::error::{Error, Result};
use crate::events::{self, Event};
use crate::keys;
use crate::types::{Issue, Suggestion};

/// Stones descending, then older first. Stable.
pub fn sort_issues_by_stones(issues: &[Issue]) -> Vec<Issue> {
    let mut sorted = issues.to_vec();
    sorted.sort_by(|a, b| {
        b.stones
            .cmp(&a.stones)
            .then(a.creation_date.cmp(&b.creation_date))
    });
    sorted
}

/// Stones descending, then older first. Stable.
pub fn sort_suggestions_by_stones(suggestions: &[Suggestion]) -> Vec<Suggestion> {
    let mut sorted = suggestions.to_vec();
    sorted.sort_by(|a, b| {
        b.stones
            .cmp(&a.stones)
            .then(a.creation_date.cmp(&b.creation_date))
    });
    sorted
}

fn read_name(ctx: &Ctx<'_>, key: &[u8]) -> Option<String> {
    ctx.get(key).and_then(|v| String::from_utf8(v).ok())
}

impl Keeper {
    pub fn member_issue_stone(&self, ctx: &Ctx<'_>, domain: &str, member: &str) -> Option<String> {
        read_name(ctx, &keys::issue_stone(domain, member))
    }

    pub fn member_suggestion_stone(
        &self,
        ctx: &Ctx<'_>,
        domain: &str,
        issue: &str,
        member: &str,
    ) -> Option<String> {
        read_name(ctx, &keys::suggestion_stone(domain, issue, member))
    }

    /// Places or moves the member's single stone on the issue list and pays
    /// the placement reward out of the treasury. Returns the reward.
    pub fn place_stone_on_issue(
        &self,
        ctx: &mut Ctx<'_>,
        domain_name: &str,
        issue_name: &str,
        member: &str,
    ) -> Result<u128> {
        let mut domain = self.require_domain(ctx, domain_name)?;
        if !domain.is_member(member) {
            return Err(Error::unauthorized("only domain members can place stones"));
        }
        let target = domain
            .issue_index(issue_name)
            .ok_or_else(|| Error::unknown("issue not found"))?;
        let key = keys::issue_stone(domain_name, member);
        if let Some(previous) = read_name(ctx, &key) {
            if previous == issue_name {
                return Err(Error::invalid("stone already placed on this issue"));
            }
            if let Some(old) = domain.issues.iter_mut().find(|i| i.name == previous) {
                old.stones = old.stones.saturating_sub(1);
            }
        }
        let now = ctx.block_time();
        let issue = &mut domain.issues[target];
        issue.stones += 1;
        issue.last_activity_at = now;
        ctx.set(&key, issue_name.as_bytes());

        let reward = domain.pay_reward();
        self.set_domain(ctx, &domain)?;
        ctx.emit(
            Event::new(events::PLACE_STONE_ISSUE)
                .attr("domain", domain_name)
                .attr("issue", issue_name)
                .attr("voter", member)
                .attr("reward", reward),
        );
        Ok(reward)
    }

    /// Same as [`Keeper::place_stone_on_issue`] for one issue's suggestion
    /// list; each issue has its own list.
    pub fn place_stone_on_suggestion(
        &self,
        ctx: &mut Ctx<'_>,
        domain_name: &str,
        issue_name: &str,
        suggestion_name: &str,
        member: &str,
    ) -> Result<u128> {
        let mut domain = self.require_domain(ctx, domain_name)?;
        if !domain.is_member(member) {
            return Err(Error::unauthorized("only domain members can place stones"));
        }
        let i = domain
            .issue_index(issue_name)
            .ok_or_else(|| Error::unknown("issue not found"))?;
        let s = domain.issues[i]
            .suggestion_index(suggestion_name)
            .ok_or_else(|| Error::unknown("suggestion not found"))?;
        let key = keys::suggestion_stone(domain_name, issue_name, member);
        if let Some(previous) = read_name(ctx, &key) {
            if previous == suggestion_name {
                return Err(Error::invalid("stone already placed on this suggestion"));
            }
            if let Some(old) = domain.issues[i]
                .suggestions
                .iter_mut()
                .find(|s| s.name == previous)
            {
                old.stones = old.stones.saturating_sub(1);
            }
        }
        let now = ctx.block_time();
        domain.issues[i].suggestions[s].stones += 1;
        domain.issues[i].last_activity_at = now;
        ctx.set(&key, suggestion_name.as_bytes());

        let reward = domain.pay_reward();
        self.set_domain(ctx, &domain)?;
        ctx.emit(
            Event::new(events::PLACE_STONE_SUGGESTION)
                .attr("domain", domain_name)
                .attr("issue", issue_name)
                .attr("suggestion", suggestion_name)
                .attr("voter", member)
                .attr("reward", reward),
        );
        Ok(reward)
    }
}
