use super::Keeper;
use crate::context::Ctx;
use crate::error::{Error, Result};
use crate::events::{self, Event};
use crate::keys;
use crate::params::{BPS_DENOMINATOR, PUB_KEY_LEN, STAKE_MIN, STAKE_TRANSFER_LIMIT_BPS};
use crate::types::{Coins, Validator, ValidatorUpdate};
use tracing::{info, warn};

impl Keeper {
    pub fn get_validator(&self, ctx: &Ctx<'_>, operator: &str) -> Result<Option<Validator>> {
        ctx.load(&keys::validator(operator))
    }

    pub fn set_validator(&self, ctx: &mut Ctx<'_>, validator: &Validator) -> Result<()> {
        ctx.save(&keys::validator(&validator.operator_addr), validator)
    }

    fn require_validator(&self, ctx: &Ctx<'_>, operator: &str) -> Result<Validator> {
        self.get_validator(ctx, operator)?
            .ok_or_else(|| Error::unknown("validator not found"))
    }

    /// Looks the validator up through the `val-pubkey:` reverse index.
    pub fn get_validator_by_pub_key(
        &self,
        ctx: &Ctx<'_>,
        pub_key: &[u8],
    ) -> Result<Option<Validator>> {
        let Some(operator) = ctx.get(&keys::validator_pub_key(pub_key)) else {
            return Ok(None);
        };
        let operator =
            String::from_utf8(operator).map_err(|_| Error::logic("corrupt pubkey index"))?;
        self.get_validator(ctx, &operator)
    }

    /// Every validator in operator-address order.
    pub fn all_validators(&self, ctx: &Ctx<'_>) -> Result<Vec<Validator>> {
        ctx.scan(keys::VALIDATOR_PREFIX.as_bytes())
            .into_iter()
            .map(|(_, value)| crate::codec::decode(&value))
            .collect()
    }

    /// Proof-of-Domain registration: the operator must belong to `domain`
    /// and bond at least `STAKE_MIN`.
    pub fn register_validator(
        &self,
        ctx: &mut Ctx<'_>,
        operator: &str,
        pub_key: &[u8],
        stake: Coins,
        domain_name: &str,
    ) -> Result<Validator> {
        if pub_key.len() != PUB_KEY_LEN {
            return Err(Error::invalid("pubkey must be 32 bytes (ed25519)"));
        }
        let bonded = stake.pnyx_amount();
        if bonded < STAKE_MIN {
            return Err(Error::insufficient(format!(
                "stake {bonded} below minimum {STAKE_MIN}"
            )));
        }
        let domain = self.require_domain(ctx, domain_name)?;
        if !domain.is_member(operator) {
            return Err(Error::unauthorized("operator is not a member of the domain"));
        }
        if ctx.has(&keys::validator(operator)) {
            return Err(Error::invalid("validator already registered"));
        }
        if ctx.has(&keys::validator_pub_key(pub_key)) {
            return Err(Error::invalid("pubkey already bound to a validator"));
        }

        let mut validator = Validator {
            operator_addr: operator.to_string(),
            pub_key: pub_key.to_vec(),
            stake,
            domains: vec![domain_name.to_string()],
            power: 0,
            jailed: false,
            jailed_until: 0,
            missed_blocks: 0,
        };
        validator.refresh_power();
        self.set_validator(ctx, &validator)?;
        ctx.set(&keys::validator_pub_key(pub_key), operator.as_bytes());
        ctx.emit(
            Event::new(events::REGISTER_VALIDATOR)
                .attr("operator", operator)
                .attr("domain", domain_name)
                .attr("power", validator.power),
        );
        info!(
            "validator {} registered in {} with power {}",
            operator, domain_name, validator.power
        );
        Ok(validator)
    }

    /// Cumulative withdrawals out of a domain's validators may not exceed
    /// 10% of what the domain has paid out.
    pub fn validate_stake_transfer(
        &self,
        ctx: &Ctx<'_>,
        domain_name: &str,
        amount: u128,
    ) -> Result<()> {
        let domain = self.require_domain(ctx, domain_name)?;
        if domain.total_payouts == 0 {
            return Err(Error::insufficient("no payouts yet, stake transfers not allowed"));
        }
        let limit =
            domain.total_payouts as u128 * STAKE_TRANSFER_LIMIT_BPS / BPS_DENOMINATOR as u128;
        let after = (domain.transferred_stake as u128).saturating_add(amount);
        if after > limit {
            return Err(Error::insufficient(format!(
                "transfer {amount} exceeds limit {limit} (already transferred {})",
                domain.transferred_stake
            )));
        }
        Ok(())
    }

    /// Unbonds `amount`. Dropping under `STAKE_MIN` removes the validator.
    /// Returns the coins released to the operator.
    pub fn withdraw_stake(&self, ctx: &mut Ctx<'_>, operator: &str, amount: u128) -> Result<Coins> {
        let mut validator = self.require_validator(ctx, operator)?;
        let staked = validator.stake.pnyx_amount();
        if amount > staked {
            return Err(Error::insufficient(format!(
                "withdraw {amount} exceeds current stake {staked}"
            )));
        }
        let Some(domain_name) = validator.domains.first().cloned() else {
            return Err(Error::invalid("validator has no domains"));
        };
        self.validate_stake_transfer(ctx, &domain_name, amount)?;

        let mut domain = self.require_domain(ctx, &domain_name)?;
        domain.transferred_stake = domain
            .transferred_stake
            .saturating_add(u64::try_from(amount).unwrap_or(u64::MAX));
        self.set_domain(ctx, &domain)?;

        let remaining = staked - amount;
        ctx.emit(
            Event::new(events::WITHDRAW_STAKE)
                .attr("operator", operator)
                .attr("amount", amount),
        );
        if remaining < STAKE_MIN {
            // Whatever is left goes back to the operator along with the request.
            return self.remove_validator(ctx, operator);
        }
        validator.stake.set_pnyx(remaining);
        validator.refresh_power();
        self.set_validator(ctx, &validator)?;
        Ok(Coins::pnyx(amount))
    }

    /// Deletes the validator and returns its bonded stake for release.
    pub fn remove_validator(&self, ctx: &mut Ctx<'_>, operator: &str) -> Result<Coins> {
        let validator = self.require_validator(ctx, operator)?;
        ctx.delete(&keys::validator(operator));
        ctx.delete(&keys::validator_pub_key(&validator.pub_key));
        ctx.emit(
            Event::new(events::REMOVE_VALIDATOR)
                .attr("operator", operator)
                .attr("stake", validator.stake.pnyx_amount()),
        );
        info!("validator {} removed", operator);
        Ok(validator.stake)
    }

    /// Drops registered domains that no longer list the operator. Returns
    /// false when none remain.
    pub fn enforce_domain_membership(&self, ctx: &mut Ctx<'_>, operator: &str) -> Result<bool> {
        let Some(mut validator) = self.get_validator(ctx, operator)? else {
            return Ok(false);
        };
        let mut active = Vec::with_capacity(validator.domains.len());
        for name in &validator.domains {
            if let Some(domain) = self.get_domain(ctx, name)? {
                if domain.is_member(operator) {
                    active.push(name.clone());
                }
            }
        }
        if active.is_empty() {
            return Ok(false);
        }
        if active != validator.domains {
            validator.domains = active;
            self.set_validator(ctx, &validator)?;
        }
        Ok(true)
    }

    /// Removes validators without an active domain, then validators under
    /// `STAKE_MIN`. Stake of validators removed here is forfeited.
    pub fn enforce_validator_set(&self, ctx: &mut Ctx<'_>) -> Result<()> {
        for validator in self.all_validators(ctx)? {
            if !self.enforce_domain_membership(ctx, &validator.operator_addr)? {
                warn!(
                    "validator {} lost membership in all its domains",
                    validator.operator_addr
                );
                self.remove_validator(ctx, &validator.operator_addr)?;
            }
        }
        for validator in self.all_validators(ctx)? {
            if validator.stake.pnyx_amount() < STAKE_MIN {
                warn!("validator {} is under-staked", validator.operator_addr);
                self.remove_validator(ctx, &validator.operator_addr)?;
            }
        }
        Ok(())
    }

    /// Full `{pub_key, power}` list for the consensus engine; jailed
    /// validators report 0.
    pub fn build_validator_updates(&self, ctx: &Ctx<'_>) -> Result<Vec<ValidatorUpdate>> {
        Ok(self
            .all_validators(ctx)?
            .into_iter()
            .map(|v| ValidatorUpdate {
                power: if v.jailed { 0 } else { v.power },
                pub_key: v.pub_key,
            })
            .collect())
    }
}
