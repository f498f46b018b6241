//! Coin movement between user accounts and the module account. The keeper
//! only does ledger accounting; handlers call out through [`CoinMover`].

use crate::error::{Error, Result};
use crate::types::{Coin, Coins};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[async_trait]
pub trait CoinMover: Send + Sync {
    async fn send_from_account_to_module(
        &self,
        from: &str,
        module: &str,
        coins: &Coins,
    ) -> Result<()>;
    async fn send_from_module_to_account(
        &self,
        module: &str,
        to: &str,
        coins: &Coins,
    ) -> Result<()>;
}

/// Ordered in-memory balances for tests and the devnet. Module accounts
/// live in the same table under their module name.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBank {
    balances: Arc<Mutex<BTreeMap<String, Coins>>>,
}

impl InMemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fund(&self, account: &str, coin: Coin) {
        let mut balances = self.balances.lock().await;
        balances.entry(account.to_string()).or_default().add(&coin);
    }

    pub async fn balance(&self, account: &str) -> Coins {
        self.balances
            .lock()
            .await
            .get(account)
            .cloned()
            .unwrap_or_default()
    }

    async fn transfer(&self, from: &str, to: &str, coins: &Coins) -> Result<()> {
        let mut balances = self.balances.lock().await;
        let mut source = balances.get(from).cloned().unwrap_or_default();
        for coin in coins.iter() {
            source = source.checked_sub(coin).ok_or_else(|| {
                Error::insufficient(format!("{from} holds less than {}{}", coin.amount, coin.denom))
            })?;
        }
        balances.insert(from.to_string(), source);
        let target = balances.entry(to.to_string()).or_default();
        for coin in coins.iter() {
            target.add(coin);
        }
        debug!("bank moved {:?} from {} to {}", coins, from, to);
        Ok(())
    }
}

#[async_trait]
impl CoinMover for InMemoryBank {
    async fn send_from_account_to_module(
        &self,
        from: &str,
        module: &str,
        coins: &Coins,
    ) -> Result<()> {
        self.transfer(from, module, coins).await
    }

    async fn send_from_module_to_account(
        &self,
        module: &str,
        to: &str,
        coins: &Coins,
    ) -> Result<()> {
        self.transfer(module, to, coins).await
    }
}
