use crate::config::{create_hasher, Config};
use crate::error::Error;
use crate::hash::{slot_index, ShardKey, TableHasher};
use crate::iter::SnapshotIter;
use crate::shard::{write_entries, Partition};
use crate::stats::{PartitionStats, ShardOps};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;
use std::sync::OnceLock;

/// Concurrent map partitioned over a fixed number of lazily created shards.
///
/// Every key is routed to exactly one slot. A slot stays empty until the
/// first key routed to it is written; from then on it owns one partition
/// with its own read-write lock, so operations on keys in different
/// partitions never contend.
///
/// Whole-map operations (`len`, `keys`, `for_each`, `partition_stats`,
/// `clear`) visit partitions one after another and are not atomic across
/// partitions.
///
/// # Example
///
/// ```rust
/// use partitionmap::PartitionMap;
///
/// let map = PartitionMap::new();
/// map.put("a", 1).put("b", 2).put("a", 3);
///
/// assert_eq!(map.get(&"a"), Some(3));
/// assert_eq!(map.keys(), vec!["a", "b"]);
/// assert_eq!(map.values(), vec![3, 2]);
/// ```
pub struct PartitionMap<K, V> {
    slots: Box<[OnceLock<Partition<K, V>>]>,
    hasher: TableHasher,
    capacity_per_shard: Option<usize>,
}

impl<K, V> PartitionMap<K, V>
where
    K: ShardKey + Hash + Eq,
{
    /// Create a new map with defaults (128 slots, ahash).
    pub fn new() -> Self {
        Self::from_config(Config::default())
    }

    /// Create a new map with `count` partition slots.
    pub fn with_shard_count(count: usize) -> Result<Self, Error> {
        Self::with_config(Config::default().shard_count(count)?)
    }

    /// Create a new map with custom config.
    pub fn with_config(config: Config) -> Result<Self, Error> {
        if config.shard_count == 0 {
            return Err(Error::InvalidShardCount);
        }
        Ok(Self::from_config(config))
    }

    fn from_config(config: Config) -> Self {
        let slots = (0..config.shard_count).map(|_| OnceLock::new()).collect();
        Self {
            slots,
            hasher: create_hasher(config.hash_function),
            capacity_per_shard: config.capacity_per_shard,
        }
    }

    /// Number of partition slots, fixed at construction.
    pub fn shard_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots whose partition has been created.
    pub fn allocated_partitions(&self) -> usize {
        self.partitions().count()
    }

    /// Figure out which slot this key belongs to.
    #[inline]
    pub fn slot_index<Q>(&self, key: &Q) -> usize
    where
        Q: ShardKey + ?Sized,
    {
        slot_index(key, self.slots.len())
    }

    /// Find the partition owning `key`, creating it when `create` is set.
    ///
    /// Two threads racing to create the same partition converge on a single
    /// instance; only the winner's initializer runs.
    fn resolve<Q>(&self, key: &Q, create: bool) -> Option<&Partition<K, V>>
    where
        Q: ShardKey + ?Sized,
    {
        let idx = self.slot_index(key);
        let slot = &self.slots[idx];
        if let Some(partition) = slot.get() {
            return Some(partition);
        }
        if !create {
            return None;
        }
        Some(slot.get_or_init(|| {
            log::debug!("materialized partition {}", idx);
            Partition::new(self.hasher.clone(), self.capacity_per_shard)
        }))
    }

    /// Allocated partitions with their slot index, in ascending slot order.
    fn partitions(&self) -> impl Iterator<Item = (usize, &Partition<K, V>)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.get().map(|partition| (idx, partition)))
    }

    /// Insert or overwrite the value for `key`. Returns the map for chaining.
    ///
    /// # Example
    ///
    /// ```rust
    /// use partitionmap::PartitionMap;
    ///
    /// let map = PartitionMap::new();
    /// map.put(1u64, "one").put(2u64, "two");
    /// assert_eq!(map.len(), 2);
    /// ```
    pub fn put(&self, key: K, value: V) -> &Self {
        if let Some(partition) = self.resolve(&key, true) {
            partition.put(key, value);
        }
        self
    }

    /// Get a copy of the value stored for `key`.
    ///
    /// Never creates a partition: a key routed to an empty slot is simply
    /// absent.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ShardKey + Hash + Eq + ?Sized,
        V: Clone,
    {
        self.resolve(key, false)?.get(key)
    }

    /// Get the value stored for `key`, or `default` when it is absent.
    pub fn get_or_default<Q>(&self, key: &Q, default: V) -> V
    where
        K: Borrow<Q>,
        Q: ShardKey + Hash + Eq + ?Sized,
        V: Clone,
    {
        self.get(key).unwrap_or(default)
    }

    /// Check if `key` is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ShardKey + Hash + Eq + ?Sized,
    {
        self.resolve(key, false)
            .is_some_and(|partition| partition.contains_key(key))
    }

    /// Remove `key`. A missing key, or a key whose partition was never
    /// created, is a no-op.
    pub fn delete<Q>(&self, key: &Q) -> &Self
    where
        K: Borrow<Q>,
        Q: ShardKey + Hash + Eq + ?Sized,
    {
        if let Some(partition) = self.resolve(key, false) {
            partition.del(key);
        }
        self
    }

    /// Remove every entry from every allocated partition.
    ///
    /// Partitions stay allocated; empty slots are not created just to be
    /// cleared.
    pub fn clear(&self) -> &Self {
        let mut cleared = 0usize;
        for (_, partition) in self.partitions() {
            partition.clear();
            cleared += 1;
        }
        log::trace!("cleared {} partitions", cleared);
        self
    }

    /// Get the total number of entries across all partitions.
    pub fn len(&self) -> usize {
        self.partitions().map(|(_, partition)| partition.len()).sum()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.partitions().all(|(_, partition)| partition.is_empty())
    }

    /// Call `visit` for every entry, partition by partition in slot order.
    ///
    /// Each partition is copied under its read lock and visited after the
    /// lock is released, so the visitor may call back into the map. The
    /// visitor can therefore observe values that have since been changed.
    pub fn for_each<F>(&self, mut visit: F) -> &Self
    where
        K: Clone,
        V: Clone,
        F: FnMut(&K, &V),
    {
        for (_, partition) in self.partitions() {
            partition.for_each(&mut visit);
        }
        self
    }

    /// All keys, sorted ascending. Empty for an empty map.
    pub fn keys(&self) -> Vec<K>
    where
        K: Ord + Clone,
    {
        let mut keys = Vec::with_capacity(self.len());
        for (_, partition) in self.partitions() {
            keys.extend(partition.keys());
        }
        keys.sort_unstable();
        keys
    }

    /// All values, in the order of [`keys`](Self::keys).
    ///
    /// Keys are collected first and each value is fetched afterwards. A key
    /// deleted in between is skipped, so under concurrent writes the result
    /// may be shorter than the key list.
    pub fn values(&self) -> Vec<V>
    where
        K: Ord + Clone,
        V: Clone,
    {
        let keys = self.keys();
        let mut values = Vec::with_capacity(keys.len());
        for key in &keys {
            if let Some(value) = self.get(key) {
                values.push(value);
            }
        }
        values
    }

    /// Snapshot-per-partition iterator over all entries.
    ///
    /// # Example
    ///
    /// ```rust
    /// use partitionmap::PartitionMap;
    ///
    /// let map = PartitionMap::new();
    /// map.put("key1", 1).put("key2", 2);
    ///
    /// let total: i32 = map.iter_snapshot().map(|(_, v)| v).sum();
    /// assert_eq!(total, 3);
    /// ```
    pub fn iter_snapshot(&self) -> SnapshotIter<'_, K, V>
    where
        K: Clone,
        V: Clone,
    {
        SnapshotIter::new(&self.slots)
    }

    /// Key distribution over the allocated partitions.
    pub fn partition_stats(&self) -> PartitionStats {
        PartitionStats::from_counts(
            self.partitions()
                .map(|(idx, partition)| (idx, partition.len())),
        )
    }

    /// Operation counters per allocated slot.
    ///
    /// Counters only move with the `metrics` feature; otherwise every entry
    /// is zero.
    pub fn operations(&self) -> BTreeMap<usize, ShardOps> {
        self.partitions()
            .map(|(idx, partition)| (idx, partition.stats()))
            .collect()
    }
}

impl<K, V> Default for PartitionMap<K, V>
where
    K: ShardKey + Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

/// One `key: value` line per entry, sorted by key.
///
/// Each partition is copied on its own, so concurrent writers may produce
/// output that mixes states from different instants.
impl<K, V> fmt::Display for PartitionMap<K, V>
where
    K: ShardKey + Hash + Eq + Ord + Clone + fmt::Display,
    V: Clone + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Concatenated sorted runs; the stable sort merges them.
        let mut entries: Vec<(K, V)> = Vec::new();
        for (_, partition) in self.partitions() {
            entries.extend(partition.sorted_snapshot());
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        write_entries(f, &entries)
    }
}

/// Operations on a map reference that may be absent.
///
/// `None` behaves like an empty map that ignores writes: lookups report
/// absence, aggregates are empty, and mutators return the receiver
/// unchanged.
///
/// # Example
///
/// ```rust
/// use partitionmap::{MaybePartitionMap, PartitionMap};
///
/// let absent: Option<&PartitionMap<String, i32>> = None;
/// assert_eq!(absent.put("a".to_string(), 1).len(), 0);
/// assert_eq!(absent.get_or_default("a", 7), 7);
/// ```
pub trait MaybePartitionMap<K, V>: Sized {
    /// See [`PartitionMap::put`].
    fn put(self, key: K, value: V) -> Self;
    /// See [`PartitionMap::get`].
    fn get<Q>(self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ShardKey + Hash + Eq + ?Sized;
    /// See [`PartitionMap::get_or_default`].
    fn get_or_default<Q>(self, key: &Q, default: V) -> V
    where
        K: Borrow<Q>,
        Q: ShardKey + Hash + Eq + ?Sized;
    /// See [`PartitionMap::contains_key`].
    fn contains_key<Q>(self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ShardKey + Hash + Eq + ?Sized;
    /// See [`PartitionMap::delete`].
    fn delete<Q>(self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: ShardKey + Hash + Eq + ?Sized;
    /// See [`PartitionMap::clear`].
    fn clear(self) -> Self;
    /// See [`PartitionMap::for_each`].
    fn for_each<F: FnMut(&K, &V)>(self, visit: F) -> Self;
    /// See [`PartitionMap::keys`].
    fn keys(self) -> Vec<K>;
    /// See [`PartitionMap::values`].
    fn values(self) -> Vec<V>;
    /// See [`PartitionMap::len`].
    fn len(self) -> usize;
    /// See [`PartitionMap::is_empty`].
    fn is_empty(self) -> bool;
    /// See [`PartitionMap::partition_stats`].
    fn partition_stats(self) -> PartitionStats;
    /// The map's `Display` output, or an empty string.
    fn to_text(self) -> String
    where
        K: fmt::Display,
        V: fmt::Display;
}

impl<K, V> MaybePartitionMap<K, V> for Option<&PartitionMap<K, V>>
where
    K: ShardKey + Hash + Eq + Ord + Clone,
    V: Clone,
{
    fn put(self, key: K, value: V) -> Self {
        if let Some(map) = self {
            map.put(key, value);
        }
        self
    }

    fn get<Q>(self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ShardKey + Hash + Eq + ?Sized,
    {
        self.and_then(|map| map.get(key))
    }

    fn get_or_default<Q>(self, key: &Q, default: V) -> V
    where
        K: Borrow<Q>,
        Q: ShardKey + Hash + Eq + ?Sized,
    {
        self.get(key).unwrap_or(default)
    }

    fn contains_key<Q>(self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ShardKey + Hash + Eq + ?Sized,
    {
        self.is_some_and(|map| map.contains_key(key))
    }

    fn delete<Q>(self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: ShardKey + Hash + Eq + ?Sized,
    {
        if let Some(map) = self {
            map.delete(key);
        }
        self
    }

    fn clear(self) -> Self {
        if let Some(map) = self {
            map.clear();
        }
        self
    }

    fn for_each<F: FnMut(&K, &V)>(self, visit: F) -> Self {
        if let Some(map) = self {
            map.for_each(visit);
        }
        self
    }

    fn keys(self) -> Vec<K> {
        self.map(PartitionMap::keys).unwrap_or_default()
    }

    fn values(self) -> Vec<V> {
        self.map(PartitionMap::values).unwrap_or_default()
    }

    fn len(self) -> usize {
        self.map_or(0, PartitionMap::len)
    }

    fn is_empty(self) -> bool {
        self.map_or(true, PartitionMap::is_empty)
    }

    fn partition_stats(self) -> PartitionStats {
        self.map(PartitionMap::partition_stats).unwrap_or_default()
    }

    fn to_text(self) -> String
    where
        K: fmt::Display,
        V: fmt::Display,
    {
        self.map(|map| map.to_string()).unwrap_or_default()
    }
}
