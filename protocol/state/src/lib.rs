use std::collections::BTreeMap;
use std::ops::Bound;

pub type Hash = [u8; 32];

/// Ordered, byte-keyed storage. Iteration order is always byte-lexicographic
/// so two nodes replaying the same writes observe the same sequence.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;
    fn set(&mut self, key: &[u8], value: &[u8]);
    fn delete(&mut self, key: &[u8]);
    /// All `(key, value)` pairs whose key starts with `prefix`, ascending.
    fn prefix_scan(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)>;

    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }
}

/// Smallest key strictly greater than every key sharing `prefix`, or `None`
/// when the prefix is all `0xff` and the range is unbounded above.
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

fn prefix_range(prefix: &[u8]) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
    let upper = match prefix_end(prefix) {
        Some(end) => Bound::Excluded(end),
        None => Bound::Unbounded,
    };
    (Bound::Included(prefix.to_vec()), upper)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemStore {
    inner: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &Vec<u8>)> {
        self.inner.iter()
    }

    /// Commitment over the full ordered contents.
    pub fn state_root(&self) -> Hash {
        state_root(self.inner.iter())
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.get(key).cloned()
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.inner.insert(key.to_vec(), value.to_vec());
    }

    fn delete(&mut self, key: &[u8]) {
        self.inner.remove(key);
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.inner
            .range(prefix_range(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Hashes length-prefixed key/value pairs in iteration order. Empty input
/// yields the all-zero root.
pub fn state_root<'a, I>(entries: I) -> Hash
where
    I: IntoIterator<Item = (&'a Vec<u8>, &'a Vec<u8>)>,
{
    let mut hasher = blake3::Hasher::new();
    let mut any = false;
    for (key, value) in entries {
        any = true;
        hasher.update(&(key.len() as u64).to_be_bytes());
        hasher.update(key);
        hasher.update(&(value.len() as u64).to_be_bytes());
        hasher.update(value);
    }
    if !any {
        return [0u8; 32];
    }
    *hasher.finalize().as_bytes()
}

/// Pending mutations collected by a [`CacheStore`]. `None` marks a delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSet {
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl WriteSet {
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn apply_to(self, store: &mut dyn KvStore) {
        for (key, value) in self.writes {
            match value {
                Some(value) => store.set(&key, &value),
                None => store.delete(&key),
            }
        }
    }
}

/// Read-through overlay. Writes stay local until the caller takes the
/// [`WriteSet`] and applies it; dropping the cache discards them.
pub struct CacheStore<'a> {
    parent: &'a dyn KvStore,
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> CacheStore<'a> {
    pub fn new(parent: &'a dyn KvStore) -> Self {
        Self {
            parent,
            pending: BTreeMap::new(),
        }
    }

    pub fn into_write_set(self) -> WriteSet {
        WriteSet {
            writes: self.pending,
        }
    }
}

impl KvStore for CacheStore<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.pending.get(key) {
            Some(entry) => entry.clone(),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.pending.insert(key.to_vec(), Some(value.to_vec()));
    }

    fn delete(&mut self, key: &[u8]) {
        self.pending.insert(key.to_vec(), None);
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.prefix_scan(prefix).into_iter().collect();
        for (key, entry) in self.pending.range(prefix_range(prefix)) {
            match entry {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        merged.into_iter().collect()
    }
}
