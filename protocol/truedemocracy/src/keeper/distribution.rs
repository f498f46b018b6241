use super::Keeper;
use crate::context::Ctx;
use crate::error::Result;
use crate::keys;
use crate::params::REWARD_INTERVAL;
use crate::types::Coin;
use tracing::{debug, info, warn};

impl Keeper {
    /// Supply minted as staking rewards so far.
    pub fn total_release(&self, ctx: &Ctx<'_>) -> Result<u128> {
        Ok(ctx.load::<u128>(keys::TOTAL_RELEASE)?.unwrap_or(0))
    }

    /// Seconds since the timer under `key` last fired, or `None` when the
    /// interval has not passed yet. A missing timer is started at the
    /// current block and also yields `None`.
    fn tick(&self, ctx: &mut Ctx<'_>, key: &[u8]) -> Result<Option<i64>> {
        let now = ctx.block_time();
        let Some(last) = ctx.load::<i64>(key)? else {
            ctx.save(key, &now)?;
            return Ok(None);
        };
        let elapsed = now - last;
        if elapsed < REWARD_INTERVAL {
            return Ok(None);
        }
        Ok(Some(elapsed))
    }

    /// Pays `node_reward` into every unjailed validator's stake and grows
    /// `total_release` by the sum.
    pub fn distribute_staking_rewards(&self, ctx: &mut Ctx<'_>) -> Result<()> {
        let Some(elapsed) = self.tick(ctx, keys::LAST_REWARD_TIME)? else {
            return Ok(());
        };
        let release = self.total_release(ctx)?;
        let mut minted: u128 = 0;

        for mut validator in self.all_validators(ctx)? {
            if validator.jailed {
                continue;
            }
            let stake = validator.stake.pnyx_amount();
            let Some(reward) = treasury::node_reward(stake, release, elapsed) else {
                warn!(
                    "staking reward overflow for {}, skipped",
                    validator.operator_addr
                );
                continue;
            };
            if reward == 0 {
                continue;
            }
            validator.stake.add(&Coin::pnyx(reward));
            validator.refresh_power();
            self.set_validator(ctx, &validator)?;
            minted = minted.saturating_add(reward);
        }

        ctx.save(keys::TOTAL_RELEASE, &release.saturating_add(minted))?;
        let now = ctx.block_time();
        ctx.save(keys::LAST_REWARD_TIME, &now)?;
        info!("staking rewards minted {} over {}s", minted, elapsed);
        Ok(())
    }

    /// Credits each domain's treasury with interest capped by what the
    /// domain paid out since the previous tick.
    pub fn distribute_domain_interest(&self, ctx: &mut Ctx<'_>) -> Result<()> {
        let Some(elapsed) = self.tick(ctx, keys::LAST_INTEREST_TIME)? else {
            return Ok(());
        };
        let release = self.total_release(ctx)?;

        for mut domain in self.all_domains(ctx)? {
            let mark_key = keys::interest_mark(&domain.name);
            let mark = ctx.load::<u64>(&mark_key)?.unwrap_or(0);
            let payout = domain.total_payouts.saturating_sub(mark);
            let interest = treasury::domain_interest(
                domain.treasury.pnyx_amount(),
                payout,
                release,
                elapsed,
            );
            if interest > 0 {
                domain.treasury.add(&Coin::pnyx(interest));
                self.set_domain(ctx, &domain)?;
                debug!("domain {} earned {} interest", domain.name, interest);
            }
            if mark != domain.total_payouts {
                ctx.save(&mark_key, &domain.total_payouts)?;
            }
        }

        let now = ctx.block_time();
        ctx.save(keys::LAST_INTEREST_TIME, &now)?;
        Ok(())
    }

    /// Starts both reward timers at the current block and zeroes the
    /// released supply.
    pub fn init_reward_state(&self, ctx: &mut Ctx<'_>) -> Result<()> {
        let now = ctx.block_time();
        ctx.save(keys::LAST_REWARD_TIME, &now)?;
        ctx.save(keys::LAST_INTEREST_TIME, &now)?;
        ctx.save(keys::TOTAL_RELEASE, &0u128)
    }
}
