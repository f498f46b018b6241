//! Block hooks driven by the consensus engine.

use crate::context::Ctx;
use crate::error::Result;
use crate::keeper::Keeper;
use crate::types::{Evidence, ValidatorUpdate};
use tracing::debug;

impl Keeper {
    /// Applies misbehaviour evidence reported for the previous block.
    pub fn begin_block(&self, ctx: &mut Ctx<'_>, evidence: &[Evidence]) -> Result<()> {
        for item in evidence {
            self.handle_evidence(ctx, item)?;
        }
        Ok(())
    }

    /// The fixed end-of-block pipeline. Returns the validator set for the
    /// next block.
    pub fn end_block(&self, ctx: &mut Ctx<'_>) -> Result<Vec<ValidatorUpdate>> {
        self.distribute_staking_rewards(ctx)?;
        self.distribute_domain_interest(ctx)?;
        self.enforce_validator_set(ctx)?;
        self.process_all_lifecycles(ctx)?;
        for name in self.domain_names(ctx) {
            self.elect_admin(ctx, &name)?;
            self.cleanup_inactive_issues(ctx, &name)?;
        }
        self.check_and_execute_big_purges(ctx)?;
        let updates = self.build_validator_updates(ctx)?;
        debug!(
            "end_block at height {} produced {} validator updates",
            ctx.block_height(),
            updates.len()
        );
        Ok(updates)
    }
}
