use crate::hash::TableHasher;
use crate::stats::{ShardOps, ShardStats};
use hashbrown::HashMap;
use parking_lot::RwLock;
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

/// A single partition: a HashMap protected by a read-write lock.
///
/// Visitors and formatting work on a copy taken under the read lock, so no
/// caller-supplied code ever runs while the lock is held.
pub(crate) struct Partition<K, V> {
    map: RwLock<HashMap<K, V, TableHasher>>,
    stats: ShardStats,
}

impl<K, V> Partition<K, V>
where
    K: Hash + Eq,
{
    pub fn new(hasher: TableHasher, capacity: Option<usize>) -> Self {
        let map = match capacity {
            Some(capacity) => HashMap::with_capacity_and_hasher(capacity, hasher),
            None => HashMap::with_hasher(hasher),
        };
        Self {
            map: RwLock::new(map),
            stats: ShardStats::new(),
        }
    }

    /// Get a copy of the value stored for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let map = self.map.read();
        let result = map.get(key).cloned();
        if result.is_some() {
            self.stats.record_read();
        }
        result
    }

    /// Check if a key exists without cloning the value.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.read().contains_key(key)
    }

    /// Insert or overwrite the value for `key`.
    pub fn put(&self, key: K, value: V) -> &Self {
        let mut map = self.map.write();
        if map.insert(key, value).is_none() {
            self.stats.record_write();
        }
        self
    }

    /// Remove `key`; a missing key is a no-op.
    pub fn del<Q>(&self, key: &Q) -> &Self
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut map = self.map.write();
        if map.remove(key).is_some() {
            self.stats.record_remove();
        }
        self
    }

    /// Remove every entry, keeping the allocated table.
    pub fn clear(&self) -> &Self {
        self.map.write().clear();
        self
    }

    /// Get the number of entries in this partition.
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    /// Check if this partition is empty.
    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }

    /// All keys, sorted ascending. Sorting happens after the lock is released.
    pub fn keys(&self) -> Vec<K>
    where
        K: Ord + Clone,
    {
        let mut keys: Vec<K> = {
            let map = self.map.read();
            map.keys().cloned().collect()
        };
        keys.sort_unstable();
        keys
    }

    /// Point-in-time copy of every entry, in table order.
    pub fn snapshot(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        let map = self.map.read();
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Point-in-time copy of every entry, keys ascending. Sorting happens
    /// after the lock is released.
    pub fn sorted_snapshot(&self) -> Vec<(K, V)>
    where
        K: Ord + Clone,
        V: Clone,
    {
        let mut entries = self.snapshot();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Call `visit` for every entry of a snapshot, outside the lock.
    pub fn for_each<F>(&self, mut visit: F) -> &Self
    where
        K: Clone,
        V: Clone,
        F: FnMut(&K, &V),
    {
        for (key, value) in self.snapshot() {
            visit(&key, &value);
        }
        self
    }

    /// Get a snapshot of operation counters for this partition.
    pub fn stats(&self) -> ShardOps {
        self.stats.snapshot()
    }
}

/// Write one `key: value` line per entry, in the order given.
pub(crate) fn write_entries<K, V>(
    f: &mut fmt::Formatter<'_>,
    entries: &[(K, V)],
) -> fmt::Result
where
    K: fmt::Display,
    V: fmt::Display,
{
    for (key, value) in entries {
        writeln!(f, "{}: {}", key, value)?;
    }
    Ok(())
}

/// Partition-level inspection: one `key: value` line per entry, keys
/// ascending. The map's own `Display` merges `sorted_snapshot` runs and
/// formats them with the same `write_entries`.
impl<K, V> fmt::Display for Partition<K, V>
where
    K: Hash + Eq + Ord + Clone + fmt::Display,
    V: Clone + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_entries(f, &self.sorted_snapshot())
    }
}
