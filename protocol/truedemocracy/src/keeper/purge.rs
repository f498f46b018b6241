use super::Keeper;
use crate::context::Ctx;
use crate::error::Result;
use crate::events::{self, Event};
use crate::keys;
use crate::params::{DEFAULT_ANNOUNCEMENT_LEAD, DEFAULT_PURGE_INTERVAL};
use crate::types::BigPurgeSchedule;
use tracing::info;

impl Keeper {
    pub fn get_purge_schedule(
        &self,
        ctx: &Ctx<'_>,
        domain_name: &str,
    ) -> Result<Option<BigPurgeSchedule>> {
        ctx.load(&keys::purge_schedule(domain_name))
    }

    pub fn set_purge_schedule(&self, ctx: &mut Ctx<'_>, schedule: &BigPurgeSchedule) -> Result<()> {
        ctx.save(&keys::purge_schedule(&schedule.domain_name), schedule)
    }

    pub fn initialize_purge_schedule(&self, ctx: &mut Ctx<'_>, domain_name: &str) -> Result<()> {
        let schedule = BigPurgeSchedule {
            domain_name: domain_name.to_string(),
            next_purge_time: ctx.block_time().saturating_add(DEFAULT_PURGE_INTERVAL),
            purge_interval: DEFAULT_PURGE_INTERVAL,
            announcement_lead: DEFAULT_ANNOUNCEMENT_LEAD,
        };
        self.set_purge_schedule(ctx, &schedule)
    }

    pub fn is_purge_announced(&self, ctx: &Ctx<'_>, domain_name: &str) -> bool {
        ctx.has(&keys::purge_announced(domain_name))
    }

    /// Block tick of the purge scheduler, for every domain independently.
    pub fn check_and_execute_big_purges(&self, ctx: &mut Ctx<'_>) -> Result<()> {
        for name in self.domain_names(ctx) {
            self.check_domain_purge(ctx, &name)?;
        }
        Ok(())
    }

    fn check_domain_purge(&self, ctx: &mut Ctx<'_>, domain_name: &str) -> Result<()> {
        let Some(mut schedule) = self.get_purge_schedule(ctx, domain_name)? else {
            return Ok(());
        };
        let now = ctx.block_time();

        if now >= schedule.next_purge_time {
            self.execute_big_purge(ctx, domain_name)?;
            schedule.next_purge_time = now.saturating_add(schedule.purge_interval);
            self.set_purge_schedule(ctx, &schedule)?;
            ctx.delete(&keys::purge_announced(domain_name));
            return Ok(());
        }

        let announce_at = schedule.next_purge_time.saturating_sub(schedule.announcement_lead);
        if now >= announce_at && !self.is_purge_announced(ctx, domain_name) {
            ctx.emit(
                Event::new(events::BIG_PURGE_ANNOUNCEMENT)
                    .attr("domain", domain_name)
                    .attr("purge_time", schedule.next_purge_time)
                    .attr("block_height", ctx.block_height()),
            );
            ctx.set(&keys::purge_announced(domain_name), &[1]);
            info!(
                "big purge of {} announced for {}",
                domain_name, schedule.next_purge_time
            );
        }
        Ok(())
    }

    /// Erases every piece of anonymity state of the domain. Members,
    /// treasury and validators stay as they are.
    pub fn execute_big_purge(&self, ctx: &mut Ctx<'_>, domain_name: &str) -> Result<()> {
        let Some(mut domain) = self.get_domain(ctx, domain_name)? else {
            return Ok(());
        };
        domain.permission_register.clear();
        domain.identity_commitments.clear();
        domain.merkle_root.clear();
        domain.merkle_root_history.clear();
        self.set_domain(ctx, &domain)?;
        let nullifiers = self.purge_nullifiers(ctx, domain_name);
        ctx.emit(
            Event::new(events::BIG_PURGE_EXECUTED)
                .attr("domain", domain_name)
                .attr("block_height", ctx.block_height()),
        );
        info!(
            "big purge executed for {} ({} nullifiers cleared)",
            domain_name, nullifiers
        );
        Ok(())
    }
}
