use crate::codec;
use crate::error::Result;
use crate::events::Event;
use serde::de::DeserializeOwned;
use serde::Serialize;
use state::KvStore;

/// Everything a keeper call may touch: the (usually cached) store, the
/// block clock, and the events emitted so far.
pub struct Ctx<'a> {
    store: &'a mut dyn KvStore,
    block_time: i64,
    block_height: i64,
    events: Vec<Event>,
}

impl<'a> Ctx<'a> {
    pub fn new(store: &'a mut dyn KvStore, block_time: i64, block_height: i64) -> Self {
        Self {
            store,
            block_time,
            block_height,
            events: Vec::new(),
        }
    }

    pub fn block_time(&self) -> i64 {
        self.block_time
    }

    pub fn block_height(&self) -> i64 {
        self.block_height
    }

    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.store.get(key)
    }

    pub fn has(&self, key: &[u8]) -> bool {
        self.store.has(key)
    }

    pub fn set(&mut self, key: &[u8], value: &[u8]) {
        self.store.set(key, value);
    }

    pub fn delete(&mut self, key: &[u8]) {
        self.store.delete(key);
    }

    pub fn scan(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.store.prefix_scan(prefix)
    }

    /// Deletes every key under `prefix`; returns how many went.
    pub fn delete_prefix(&mut self, prefix: &[u8]) -> usize {
        let keys: Vec<Vec<u8>> = self.scan(prefix).into_iter().map(|(k, _)| k).collect();
        for key in &keys {
            self.store.delete(key);
        }
        keys.len()
    }

    pub fn load<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        self.store.get(key).map(|bytes| codec::decode(&bytes)).transpose()
    }

    pub fn save<T: Serialize>(&mut self, key: &[u8], value: &T) -> Result<()> {
        let bytes = codec::encode(value)?;
        self.store.set(key, &bytes);
        Ok(())
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}
