use crate::error::Error;
use crate::hash::{ShardKey, TableHasher};
use std::hash::Hash;

/// Number of partition slots used when none is configured.
pub const DEFAULT_SHARD_COUNT: usize = 128;

/// Which hash function each partition uses for its internal table.
///
/// This does not affect routing: keys are always assigned to slots by the
/// integer fast path or the CRC32C checksum (see [`crate::hash::slot_index`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashFunction {
    /// Use ahash (default, fast and well-distributed).
    #[default]
    AHash,
    /// Use fxhash (faster but potentially less distributed).
    #[cfg(feature = "fxhash")]
    FxHash,
}

/// Configuration for a PartitionMap instance.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) shard_count: usize,
    pub(crate) hash_function: HashFunction,
    pub(crate) capacity_per_shard: Option<usize>,
}

impl Config {
    /// Create a new config with defaults (128 slots, ahash).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of partition slots. Must be greater than 0.
    pub fn shard_count(mut self, count: usize) -> Result<Self, Error> {
        if count == 0 {
            return Err(Error::InvalidShardCount);
        }
        self.shard_count = count;
        Ok(self)
    }

    /// Set the hash function used inside each partition.
    pub fn hash_function(mut self, hash_fn: HashFunction) -> Self {
        self.hash_function = hash_fn;
        self
    }

    /// Reserve room for `capacity` entries whenever a partition is created.
    /// Omitted by default (HashMap default).
    pub fn capacity_per_shard(mut self, capacity: usize) -> Self {
        self.capacity_per_shard = Some(capacity);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shard_count: DEFAULT_SHARD_COUNT,
            hash_function: HashFunction::AHash,
            capacity_per_shard: None,
        }
    }
}

/// Builder for creating a PartitionMap with custom configuration.
#[derive(Debug, Default)]
pub struct PartitionMapBuilder {
    config: Config,
}

impl PartitionMapBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Set the number of partition slots. Must be greater than 0.
    pub fn shard_count(mut self, count: usize) -> Result<Self, Error> {
        self.config = self.config.shard_count(count)?;
        Ok(self)
    }

    /// Set the hash function used inside each partition.
    pub fn hash_function(mut self, hash_fn: HashFunction) -> Self {
        self.config = self.config.hash_function(hash_fn);
        self
    }

    /// Reserve room for `capacity` entries whenever a partition is created.
    pub fn capacity_per_shard(mut self, capacity: usize) -> Self {
        self.config = self.config.capacity_per_shard(capacity);
        self
    }

    /// Build a PartitionMap with the configured settings.
    pub fn build<K, V>(self) -> Result<crate::PartitionMap<K, V>, Error>
    where
        K: ShardKey + Hash + Eq,
    {
        crate::PartitionMap::with_config(self.config)
    }
}

/// Create the table hasher for the configured hash function.
pub(crate) fn create_hasher(hash_fn: HashFunction) -> TableHasher {
    match hash_fn {
        HashFunction::AHash => TableHasher::AHash(ahash::RandomState::new()),
        #[cfg(feature = "fxhash")]
        HashFunction::FxHash => TableHasher::FxHash,
    }
}
