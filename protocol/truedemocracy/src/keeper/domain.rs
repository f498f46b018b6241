use super::Keeper;
use crate::context::Ctx;
use crate::error::{Error, Result};
use crate::events::{self, Event};
use crate::keys;
use crate::params::{BPS_DENOMINATOR, DENOM};
use crate::types::{Coin, Coins, Domain, DomainOptions, Issue, Suggestion};
use tracing::info;

impl Keeper {
    pub fn get_domain(&self, ctx: &Ctx<'_>, name: &str) -> Result<Option<Domain>> {
        ctx.load(&keys::domain(name))
    }

    /// Like [`Keeper::get_domain`] but a missing domain is `UnknownRequest`.
    pub fn require_domain(&self, ctx: &Ctx<'_>, name: &str) -> Result<Domain> {
        self.get_domain(ctx, name)?
            .ok_or_else(|| Error::unknown(format!("domain {name} not found")))
    }

    pub fn set_domain(&self, ctx: &mut Ctx<'_>, domain: &Domain) -> Result<()> {
        ctx.save(&keys::domain(&domain.name), domain)
    }

    /// Names in key order. Collected up front so callers can mutate domains
    /// while walking the list.
    pub fn domain_names(&self, ctx: &Ctx<'_>) -> Vec<String> {
        let prefix = keys::DOMAIN_PREFIX.as_bytes();
        ctx.scan(prefix)
            .into_iter()
            .filter_map(|(key, _)| String::from_utf8(key[prefix.len()..].to_vec()).ok())
            .collect()
    }

    pub fn all_domains(&self, ctx: &Ctx<'_>) -> Result<Vec<Domain>> {
        ctx.scan(keys::DOMAIN_PREFIX.as_bytes())
            .into_iter()
            .map(|(_, value)| crate::codec::decode(&value))
            .collect()
    }

    /// New domain with `admin` as its only member and a fresh purge
    /// schedule.
    pub fn create_domain(
        &self,
        ctx: &mut Ctx<'_>,
        name: &str,
        admin: &str,
        initial_coins: Coins,
    ) -> Result<Domain> {
        keys::check_name("domain name", name)?;
        keys::check_name("admin", admin)?;
        if ctx.has(&keys::domain(name)) {
            return Err(Error::invalid(format!("domain {name} already exists")));
        }
        let domain = Domain::new(name, admin, initial_coins);
        self.set_domain(ctx, &domain)?;
        self.initialize_purge_schedule(ctx, name)?;
        ctx.emit(
            Event::new(events::CREATE_DOMAIN)
                .attr("domain", name)
                .attr("admin", admin),
        );
        info!("domain {} created by {}", name, admin);
        Ok(domain)
    }

    /// The admin may add anyone; with `open_join` a caller may add itself.
    pub fn add_member(
        &self,
        ctx: &mut Ctx<'_>,
        domain_name: &str,
        new_member: &str,
        caller: &str,
    ) -> Result<()> {
        let mut domain = self.require_domain(ctx, domain_name)?;
        let self_join = domain.options.open_join && caller == new_member;
        if caller != domain.admin && !self_join {
            return Err(Error::unauthorized("only the domain admin can add members"));
        }
        keys::check_name("member", new_member)?;
        if domain.is_member(new_member) {
            return Err(Error::invalid("member already exists in domain"));
        }
        domain.members.push(new_member.to_string());
        self.set_domain(ctx, &domain)?;
        ctx.emit(
            Event::new(events::ADD_MEMBER)
                .attr("domain", domain_name)
                .attr("member", new_member),
        );
        Ok(())
    }

    pub fn update_domain_options(
        &self,
        ctx: &mut Ctx<'_>,
        domain_name: &str,
        caller: &str,
        options: DomainOptions,
    ) -> Result<()> {
        let mut domain = self.require_domain(ctx, domain_name)?;
        if caller != domain.admin {
            return Err(Error::unauthorized("only the domain admin can change options"));
        }
        if options.approval_threshold_bps > BPS_DENOMINATOR {
            return Err(Error::invalid("approval threshold above 10000 bps"));
        }
        if options.default_dwell_time < 0 {
            return Err(Error::invalid("dwell time must not be negative"));
        }
        domain.options = options;
        self.set_domain(ctx, &domain)?;
        ctx.emit(Event::new(events::UPDATE_DOMAIN_OPTIONS).attr("domain", domain_name));
        Ok(())
    }

    /// Appends `suggestion` to `issue`, opening the issue if needed. The fee
    /// must cover the current put price and lands in the treasury.
    #[allow(clippy::too_many_arguments)]
    pub fn submit_proposal(
        &self,
        ctx: &mut Ctx<'_>,
        domain_name: &str,
        issue_name: &str,
        suggestion_name: &str,
        creator: &str,
        fee: u128,
        external_link: &str,
    ) -> Result<()> {
        keys::check_name("issue", issue_name)?;
        keys::check_name("suggestion", suggestion_name)?;
        let mut domain = self.require_domain(ctx, domain_name)?;
        if !domain.is_member(creator) {
            return Err(Error::unauthorized("only domain members can submit proposals"));
        }
        let existing = domain.issue_index(issue_name);
        if existing.is_none() && domain.options.only_admin_issues && creator != domain.admin {
            return Err(Error::unauthorized("only the admin can open issues"));
        }
        if let Some(idx) = existing {
            if domain.issues[idx].suggestion_index(suggestion_name).is_some() {
                return Err(Error::invalid("suggestion already exists in issue"));
            }
        }

        let put_price =
            treasury::put_price(domain.treasury.pnyx_amount(), domain.members.len() as u64);
        if fee < put_price {
            return Err(Error::insufficient(format!(
                "fee {fee} below put price {put_price}"
            )));
        }
        if domain.options.coin_burn_required {
            let burn = put_price.saturating_mul(treasury::C_DOM);
            if fee == 0 || fee < burn {
                return Err(Error::insufficient(format!(
                    "coin burn requires a fee of at least {burn}"
                )));
            }
        }
        domain.treasury.add(&Coin::new(DENOM, fee));

        let now = ctx.block_time();
        let mut suggestion = Suggestion::new(suggestion_name, creator, now);
        suggestion.external_link = external_link.to_string();
        match existing {
            Some(idx) => {
                let issue = &mut domain.issues[idx];
                issue.suggestions.push(suggestion);
                issue.last_activity_at = now;
            }
            None => {
                let mut issue = Issue::new(issue_name, now);
                issue.suggestions.push(suggestion);
                domain.issues.push(issue);
            }
        }
        self.set_domain(ctx, &domain)?;
        ctx.emit(
            Event::new(events::SUBMIT_PROPOSAL)
                .attr("domain", domain_name)
                .attr("issue", issue_name)
                .attr("suggestion", suggestion_name)
                .attr("fee", fee),
        );
        Ok(())
    }
}
