use super::Keeper;
use crate::context::Ctx;
use crate::error::{Error, Result};
use crate::events::{self, Event};
use crate::params::{
    DOWNTIME_JAIL_DURATION, MIN_SIGNED_PER_WINDOW, SIGNED_BLOCKS_WINDOW, SLASH_FRACTION_DOUBLE_SIGN,
    SLASH_FRACTION_DOWNTIME, STAKE_MIN,
};
use crate::types::{Evidence, Validator};
use tracing::{info, warn};

/// Burns `pct` percent of the pnyx stake, at least one unit. Returns the
/// amount burned.
fn slash_stake(validator: &mut Validator, pct: u128) -> u128 {
    let staked = validator.stake.pnyx_amount();
    let penalty = (staked.saturating_mul(pct) / 100).max(1).min(staked);
    validator.stake.set_pnyx(staked - penalty);
    penalty
}

impl Keeper {
    fn require_validator_by_pub_key(&self, ctx: &Ctx<'_>, pub_key: &[u8]) -> Result<Validator> {
        self.get_validator_by_pub_key(ctx, pub_key)?
            .ok_or_else(|| Error::unknown("validator not found"))
    }

    fn jail(
        &self,
        ctx: &mut Ctx<'_>,
        validator: &mut Validator,
        pct: u128,
        duration: i64,
        reason: &str,
    ) -> Result<()> {
        let burned = slash_stake(validator, pct);
        validator.jailed = true;
        validator.jailed_until = ctx.block_time().saturating_add(duration);
        validator.refresh_power();
        self.set_validator(ctx, validator)?;
        ctx.emit(
            Event::new(events::SLASH)
                .attr("operator", &validator.operator_addr)
                .attr("reason", reason)
                .attr("amount", burned)
                .attr("jailed_until", validator.jailed_until),
        );
        warn!(
            "validator {} slashed {} for {} and jailed until {}",
            validator.operator_addr, burned, reason, validator.jailed_until
        );
        Ok(())
    }

    /// Equivocation: 5% slash and a jail ten times the downtime jail.
    pub fn handle_double_sign(&self, ctx: &mut Ctx<'_>, pub_key: &[u8]) -> Result<()> {
        let mut validator = self.require_validator_by_pub_key(ctx, pub_key)?;
        self.jail(
            ctx,
            &mut validator,
            SLASH_FRACTION_DOUBLE_SIGN,
            DOWNTIME_JAIL_DURATION * 10,
            "double_sign",
        )
    }

    /// Counts a missed block. The miss that takes the counter past
    /// `SIGNED_BLOCKS_WINDOW - MIN_SIGNED_PER_WINDOW` slashes, jails and
    /// resets it. Misses while jailed are not counted.
    pub fn handle_downtime(&self, ctx: &mut Ctx<'_>, pub_key: &[u8]) -> Result<()> {
        let mut validator = self.require_validator_by_pub_key(ctx, pub_key)?;
        if validator.jailed {
            return Ok(());
        }
        validator.missed_blocks += 1;
        if validator.missed_blocks > SIGNED_BLOCKS_WINDOW - MIN_SIGNED_PER_WINDOW {
            validator.missed_blocks = 0;
            return self.jail(
                ctx,
                &mut validator,
                SLASH_FRACTION_DOWNTIME,
                DOWNTIME_JAIL_DURATION,
                "downtime",
            );
        }
        self.set_validator(ctx, &validator)
    }

    pub fn unjail(&self, ctx: &mut Ctx<'_>, operator: &str) -> Result<()> {
        let validator = self
            .get_validator(ctx, operator)?
            .ok_or_else(|| Error::unknown("validator not found"))?;
        if !validator.jailed {
            return Err(Error::invalid("validator is not jailed"));
        }
        if ctx.block_time() < validator.jailed_until {
            return Err(Error::invalid("jail duration has not elapsed"));
        }
        if validator.stake.pnyx_amount() < STAKE_MIN {
            return Err(Error::insufficient("stake below minimum after slash"));
        }
        if !self.enforce_domain_membership(ctx, operator)? {
            return Err(Error::unauthorized("operator no longer a domain member"));
        }
        // Membership enforcement may have rewritten the domain list.
        let mut validator = self
            .get_validator(ctx, operator)?
            .ok_or_else(|| Error::unknown("validator not found"))?;
        validator.jailed = false;
        validator.jailed_until = 0;
        validator.refresh_power();
        self.set_validator(ctx, &validator)?;
        ctx.emit(Event::new(events::UNJAIL).attr("operator", operator));
        info!("validator {} unjailed with power {}", operator, validator.power);
        Ok(())
    }

    /// Routes consensus evidence. Keys that match no validator are logged
    /// and skipped.
    pub fn handle_evidence(&self, ctx: &mut Ctx<'_>, evidence: &Evidence) -> Result<()> {
        let (pub_key, outcome) = match evidence {
            Evidence::Downtime { pub_key } => (pub_key, self.handle_downtime(ctx, pub_key)),
            Evidence::DoubleSign { pub_key } => (pub_key, self.handle_double_sign(ctx, pub_key)),
        };
        match outcome {
            Err(Error::UnknownRequest(_)) => {
                warn!("evidence for unknown validator key {}", hex::encode(pub_key));
                Ok(())
            }
            other => other,
        }
    }
}
