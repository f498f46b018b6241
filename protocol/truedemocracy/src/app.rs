use crate::bank::CoinMover;
use crate::context::Ctx;
use crate::error::Result;
use crate::events::Event;
use crate::genesis::GenesisState;
use crate::keeper::Keeper;
use crate::msg_server::MsgResponse;
use crate::msgs::Msg;
use crate::query::{Query, QueryResponse};
use crate::types::{Evidence, ValidatorUpdate};
use state::{CacheStore, Hash, KvStore};
use std::sync::Arc;
use tracing::{debug, info};

/// Module façade over a committed store. Every entry point runs against a
/// fresh cache overlay and only applies its writes on success.
pub struct App<S: KvStore> {
    store: S,
    keeper: Keeper,
    bank: Option<Arc<dyn CoinMover>>,
    block_time: i64,
    block_height: i64,
}

impl<S: KvStore> App<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            keeper: Keeper::new(),
            bank: None,
            block_time: 0,
            block_height: 0,
        }
    }

    pub fn with_bank(mut self, bank: Arc<dyn CoinMover>) -> Self {
        self.bank = Some(bank);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn keeper(&self) -> Keeper {
        self.keeper
    }

    pub fn block_time(&self) -> i64 {
        self.block_time
    }

    pub fn block_height(&self) -> i64 {
        self.block_height
    }

    fn write<T>(
        &mut self,
        f: impl FnOnce(Keeper, &mut Ctx<'_>) -> Result<T>,
    ) -> Result<(T, Vec<Event>)> {
        let keeper = self.keeper;
        let mut cache = CacheStore::new(&self.store);
        let mut ctx = Ctx::new(&mut cache, self.block_time, self.block_height);
        let out = f(keeper, &mut ctx)?;
        let events = ctx.into_events();
        cache.into_write_set().apply_to(&mut self.store);
        Ok((out, events))
    }

    fn read<T>(&self, f: impl FnOnce(Keeper, &Ctx<'_>) -> Result<T>) -> Result<T> {
        let mut cache = CacheStore::new(&self.store);
        let ctx = Ctx::new(&mut cache, self.block_time, self.block_height);
        f(self.keeper, &ctx)
    }

    /// Chain bootstrap at `genesis_time`, block height 0.
    pub fn init_genesis(
        &mut self,
        genesis: &GenesisState,
        genesis_time: i64,
    ) -> Result<Vec<ValidatorUpdate>> {
        self.block_time = genesis_time;
        self.block_height = 0;
        let (updates, _) = self.write(|keeper, ctx| keeper.init_genesis(ctx, genesis))?;
        Ok(updates)
    }

    pub fn export_genesis(&self) -> Result<GenesisState> {
        self.read(|keeper, ctx| keeper.export_genesis(ctx))
    }

    /// Opens a block: advances the clock and applies evidence.
    pub fn begin_block(
        &mut self,
        block_time: i64,
        block_height: i64,
        evidence: &[Evidence],
    ) -> Result<Vec<Event>> {
        self.block_time = block_time;
        self.block_height = block_height;
        let ((), events) = self.write(|keeper, ctx| keeper.begin_block(ctx, evidence))?;
        Ok(events)
    }

    /// Executes one transaction atomically.
    pub async fn deliver(&mut self, msg: &Msg) -> Result<(MsgResponse, Vec<Event>)> {
        msg.validate_basic()?;
        let keeper = self.keeper;
        let bank = self.bank.clone();
        let mut cache = CacheStore::new(&self.store);
        let mut ctx = Ctx::new(&mut cache, self.block_time, self.block_height);
        let outcome = keeper.handle(&mut ctx, bank.as_deref(), msg).await;
        let events = ctx.into_events();
        match outcome {
            Ok(response) => {
                cache.into_write_set().apply_to(&mut self.store);
                debug!("{} applied at height {}", msg.kind(), self.block_height);
                Ok((response, events))
            }
            Err(err) => {
                debug!("{} rejected: {}", msg.kind(), err);
                Err(err)
            }
        }
    }

    pub fn end_block(&mut self) -> Result<(Vec<ValidatorUpdate>, Vec<Event>)> {
        self.write(|keeper, ctx| keeper.end_block(ctx))
    }

    pub fn query(&self, query: &Query) -> Result<QueryResponse> {
        self.read(|keeper, ctx| keeper.query(ctx, query))
    }

    /// blake3 root over every stored pair.
    pub fn commit(&self) -> Hash {
        let entries = self.store.prefix_scan(b"");
        let root = state::state_root(entries.iter().map(|(k, v)| (k, v)));
        info!("committed height {} root {}", self.block_height, hex::encode(root));
        root
    }
}
