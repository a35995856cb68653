use std::{
    borrow::Borrow,
    hash::{BuildHasher, Hash},
};

use log::{debug, trace};

use super::{
    ConfigError, DefaultBuildHasher, bucket_index,
    ladder::{CapacityLadder, TableConfig},
};
use crate::chain::{self, Chain};

/// A hash map made of independent separate-chaining buckets.
///
/// The number of buckets is always a step of the configured
/// [`CapacityLadder`]. After every insert or remove that changes the
/// number of entries, the load factor (`len / capacity`) is checked
/// against the configured thresholds and the table moves at most one
/// step up or down the ladder, rehashing every entry.
#[derive(Debug, Clone)]
pub struct ChainedHashMap<K, V, S = DefaultBuildHasher> {
    buckets: Vec<Chain<K, V>>,
    items: usize,
    config: TableConfig,
    hasher: S,
}

impl<K, V> ChainedHashMap<K, V, DefaultBuildHasher> {
    /// Creates a table with `initial_capacity` buckets that grows by
    /// doubling and never shrinks below `initial_capacity`
    pub fn new(
        initial_capacity: usize,
        upper_load_factor: f32,
        lower_load_factor: f32,
    ) -> Result<Self, ConfigError> {
        let ladder = CapacityLadder::doubling(initial_capacity)?;
        Self::with_config(TableConfig::new(ladder, upper_load_factor, lower_load_factor)?)
    }

    pub fn with_config(config: TableConfig) -> Result<Self, ConfigError> {
        Self::with_config_and_hasher(config, DefaultBuildHasher::default())
    }
}

impl<K, V, S> ChainedHashMap<K, V, S> {
    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let cap = config.starting_capacity();

        Ok(Self {
            buckets: empty_buckets(cap),
            items: 0,
            config,
            hasher,
        })
    }

    /// Returns the number of entries in the table
    pub fn len(&self) -> usize {
        self.items
    }

    /// Shorthand for `self.len() == 0`
    pub fn is_empty(&self) -> bool {
        self.items == 0
    }

    /// Returns the number of buckets
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f32 {
        self.items as f32 / self.capacity() as f32
    }

    pub fn ladder(&self) -> &CapacityLadder {
        &self.config.ladder
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// The hasher used to place keys, see [`bucket_index`]
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// The `i`-th bucket, for walking a single chain
    pub fn bucket(&self, i: usize) -> Option<&Chain<K, V>> {
        self.buckets.get(i)
    }

    // [diagnostics]

    /// Number of entries in every bucket, in bucket order.
    /// Always `capacity()` long and sums up to `len()`.
    pub fn bucket_sizes(&self) -> Vec<usize> {
        self.buckets.iter().map(Chain::len).collect()
    }

    /// Every key in the table, bucket by bucket, each chain front to back
    pub fn all_keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        let mut keys = Vec::with_capacity(self.items);
        keys.extend(self.keys().cloned());
        keys
    }

    /// Same keys as [`Self::all_keys`], in ascending order
    pub fn sorted_keys(&self) -> Vec<K>
    where
        K: Ord + Clone,
    {
        let mut keys = self.all_keys();
        keys.sort();
        keys
    }

    // [adapters]

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: &self.buckets,
            // a table always has at least one bucket
            cursor: self.buckets[0].iter(),
            bucket_idx: 0,
            remaining: self.items,
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(self.iter())
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Insert a key-value pair into the table,
    /// returning the previous value (if there was any)
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let i = self.idx(&key);
        let outcome = self.buckets[i].insert(key, value);

        if outcome.is_inserted() {
            self.items += 1;
            self.maybe_resize();
        }

        outcome.into_old()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets[self.idx(key)].get(key)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let i = self.idx(key);
        self.buckets[i].get_mut(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Removes `key` from the table, returns whether it was there
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).is_some()
    }

    /// Removes `key` from the table, handing back the stored pair
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let i = self.idx(key);
        let entry = self.buckets[i].remove(key)?;

        self.items -= 1;
        self.maybe_resize();

        Some((entry.key, entry.value))
    }

    /// The bucket `key` lives in (or would live in) at the current capacity
    pub fn bucket_index_of<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + ?Sized,
    {
        self.idx(key)
    }

    // [private]

    fn idx<Q>(&self, key: &Q) -> usize
    where
        Q: Hash + ?Sized,
    {
        bucket_index(&self.hasher, key, self.capacity())
    }

    /// Moves at most one step along the ladder if the load factor left
    /// the configured bounds
    fn maybe_resize(&mut self) {
        let cap = self.capacity();
        let load = self.load_factor();

        let target = if load > self.config.upper_load_factor {
            self.config.ladder.next_up(cap)
        } else if load < self.config.lower_load_factor {
            self.config.ladder.next_down(cap)
        } else {
            None
        };

        let Some(new_cap) = target else {
            return;
        };

        debug!(target: "resize", "{} -> {} buckets ({} items, load {:.3})", cap, new_cap, self.items, load);

        let old = std::mem::take(&mut self.buckets);
        self.buckets = rehash(old, new_cap, &self.hasher);

        trace!(target: "resize", "bucket sizes after resize: {:?}", self.bucket_sizes());
    }
}

impl<K, V, S> Extend<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainedHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn empty_buckets<K, V>(cap: usize) -> Vec<Chain<K, V>> {
    (0..cap).map(|_| Chain::new()).collect()
}

/// Builds a fresh bucket array of `new_cap` buckets holding every entry
/// of `old`, each placed by its hash against the new capacity
fn rehash<K, V, S>(old: Vec<Chain<K, V>>, new_cap: usize, hasher: &S) -> Vec<Chain<K, V>>
where
    K: Hash,
    S: BuildHasher,
{
    let mut new_buckets = empty_buckets(new_cap);

    for entry in old.into_iter().flatten() {
        let i = bucket_index(hasher, &entry.key, new_cap);
        // keys were unique in the old table, no need to look for duplicates
        new_buckets[i].push_unchecked(entry);
    }

    new_buckets
}

// [iterators]

/// Walks every bucket in index order and every chain front to back.
/// Holds its own cursor, any number of these can be alive at once.
#[derive(Clone, Debug)]
pub struct Iter<'a, K, V> {
    buckets: &'a [Chain<K, V>],
    cursor: chain::Iter<'a, K, V>,
    bucket_idx: usize,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(kv) = self.cursor.next() {
                self.remaining -= 1;
                return Some(kv);
            }

            if self.bucket_idx + 1 >= self.buckets.len() {
                return None;
            }
            self.bucket_idx += 1;
            self.cursor = self.buckets[self.bucket_idx].iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

#[derive(Clone, Debug)]
pub struct Keys<'a, K, V>(Iter<'a, K, V>);

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
