//! Statistics and diagnostics types.

use std::collections::BTreeMap;
#[cfg(feature = "metrics")]
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of how keys are spread over the allocated partitions.
///
/// Each partition is counted at a different instant, so under concurrent
/// writes the figures may describe a state that never existed as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionStats {
    /// Number of partitions that have been materialized.
    pub parts: usize,
    /// Total number of keys across all partitions.
    pub keys: usize,
    /// Integer average of keys per allocated partition (0 when none).
    pub avg: usize,
    /// Key count per allocated slot index.
    pub part_keys: BTreeMap<usize, usize>,
}

impl PartitionStats {
    pub(crate) fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut stats = PartitionStats::default();
        for (idx, len) in counts {
            stats.parts += 1;
            stats.keys += len;
            stats.part_keys.insert(idx, len);
        }
        if stats.parts > 0 {
            stats.avg = stats.keys / stats.parts;
        }
        stats
    }

    /// Largest partition load divided by the average load.
    ///
    /// 1.0 means perfectly even; returns 0.0 for an empty map.
    pub fn max_load_ratio(&self) -> f64 {
        if self.parts == 0 || self.keys == 0 {
            return 0.0;
        }
        let max = self.part_keys.values().copied().max().unwrap_or(0);
        let avg = self.keys as f64 / self.parts as f64;
        max as f64 / avg
    }
}

/// Per-partition operation statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardOps {
    /// Number of successful lookups on this partition.
    pub reads: u64,
    /// Number of inserts of previously absent keys.
    pub writes: u64,
    /// Number of removals of present keys.
    pub removes: u64,
}

/// Thread-safe statistics tracker for a single partition.
#[cfg(feature = "metrics")]
pub(crate) struct ShardStats {
    reads: AtomicU64,
    writes: AtomicU64,
    removes: AtomicU64,
}

#[cfg(feature = "metrics")]
impl ShardStats {
    pub fn new() -> Self {
        Self {
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            removes: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_remove(&self) {
        self.removes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ShardOps {
        ShardOps {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
        }
    }
}

/// Zero-sized placeholder when metrics are disabled.
#[cfg(not(feature = "metrics"))]
pub(crate) struct ShardStats;

#[cfg(not(feature = "metrics"))]
impl ShardStats {
    pub fn new() -> Self {
        ShardStats
    }

    #[inline]
    pub fn record_read(&self) {}

    #[inline]
    pub fn record_write(&self) {}

    #[inline]
    pub fn record_remove(&self) {}

    pub fn snapshot(&self) -> ShardOps {
        ShardOps::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_counts() {
        let stats = PartitionStats::from_counts(vec![(3, 4), (10, 1), (77, 0)]);
        assert_eq!(stats.parts, 3);
        assert_eq!(stats.keys, 5);
        assert_eq!(stats.avg, 1);
        assert_eq!(stats.part_keys.get(&3), Some(&4));
        assert_eq!(stats.part_keys.get(&77), Some(&0));
    }

    #[test]
    fn test_empty_counts() {
        let stats = PartitionStats::from_counts(Vec::new());
        assert_eq!(stats, PartitionStats::default());
        assert_eq!(stats.max_load_ratio(), 0.0);
    }

    #[test]
    fn test_max_load_ratio() {
        let stats = PartitionStats::from_counts(vec![(0, 3), (1, 1)]);
        assert!((stats.max_load_ratio() - 1.5).abs() < f64::EPSILON);
    }
}
