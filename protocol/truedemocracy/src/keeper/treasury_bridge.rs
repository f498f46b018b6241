use super::Keeper;
use crate::bank::CoinMover;
use crate::context::Ctx;
use crate::error::{Error, Result};
use crate::events::{self, Event};
use crate::params::{DENOM, MODULE_NAME};
use crate::types::{Coin, Coins, Domain};
use tracing::info;

fn check_coin(coin: &Coin) -> Result<()> {
    if coin.amount == 0 {
        return Err(Error::invalid("amount must be positive"));
    }
    if coin.denom != DENOM {
        return Err(Error::invalid(format!("only {DENOM} can be moved")));
    }
    Ok(())
}

impl Keeper {
    fn bridge_domain(&self, ctx: &Ctx<'_>, domain_name: &str) -> Result<Domain> {
        self.get_domain(ctx, domain_name)?
            .ok_or_else(|| Error::not_found(format!("domain {domain_name} not found")))
    }

    /// Moves `coin` from the depositor into the domain treasury.
    pub async fn deposit_to_domain(
        &self,
        ctx: &mut Ctx<'_>,
        bank: Option<&dyn CoinMover>,
        domain_name: &str,
        depositor: &str,
        coin: &Coin,
    ) -> Result<()> {
        let bank = bank.ok_or_else(|| Error::logic("no coin mover configured"))?;
        let mut domain = self.bridge_domain(ctx, domain_name)?;
        check_coin(coin)?;

        domain.treasury.add(coin);
        self.set_domain(ctx, &domain)?;
        bank.send_from_account_to_module(depositor, MODULE_NAME, &Coins::from_coins([coin.clone()]))
            .await?;
        ctx.emit(
            Event::new(events::DOMAIN_DEPOSIT)
                .attr("domain", domain_name)
                .attr("depositor", depositor)
                .attr("amount", coin.amount),
        );
        info!("{} deposited {} into {}", depositor, coin.amount, domain_name);
        Ok(())
    }

    /// Admin-only payout from the domain treasury to `recipient`.
    #[allow(clippy::too_many_arguments)]
    pub async fn withdraw_from_domain(
        &self,
        ctx: &mut Ctx<'_>,
        bank: Option<&dyn CoinMover>,
        domain_name: &str,
        caller: &str,
        recipient: &str,
        coin: &Coin,
    ) -> Result<()> {
        let bank = bank.ok_or_else(|| Error::logic("no coin mover configured"))?;
        let mut domain = self.bridge_domain(ctx, domain_name)?;
        if caller != domain.admin {
            return Err(Error::unauthorized("only the domain admin can withdraw"));
        }
        check_coin(coin)?;
        domain.treasury = domain.treasury.checked_sub(coin).ok_or_else(|| {
            Error::insufficient(format!(
                "treasury {} below requested {}",
                domain.treasury.pnyx_amount(),
                coin.amount
            ))
        })?;

        self.set_domain(ctx, &domain)?;
        bank.send_from_module_to_account(MODULE_NAME, recipient, &Coins::from_coins([coin.clone()]))
            .await?;
        ctx.emit(
            Event::new(events::DOMAIN_WITHDRAWAL)
                .attr("domain", domain_name)
                .attr("recipient", recipient)
                .attr("amount", coin.amount),
        );
        info!("{} withdrew {} from {} to {}", caller, coin.amount, domain_name, recipient);
        Ok(())
    }
}
