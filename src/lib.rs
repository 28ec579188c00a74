//! # PartitionMap
//!
//! A concurrent map that shards its key space over a fixed number of
//! independently locked partitions.
//!
//! Every key is routed to one slot: integers by `value % N`, everything else
//! by a CRC32C checksum of its text form. A slot's partition is created the
//! first time a key lands in it, and from then on all operations on that
//! slot's keys go through that partition's read-write lock only. Operations
//! on different partitions never block each other.
//!
//! ## Features
//!
//! - **Lazy partitions**: memory is only spent on slots that receive keys
//! - **Deterministic routing**: the same key always maps to the same slot
//! - **Sorted enumeration**: `keys()`, `values()` and `Display` follow key order
//! - **Lock-free callbacks**: visitors run on a copy, never under a lock
//! - **Statistics**: per-partition key counts and optional operation counters
//!
//! ## Example
//!
//! ```rust
//! use partitionmap::PartitionMap;
//!
//! let map = PartitionMap::new();
//!
//! map.put("a", 1).put("b", 2).put("a", 3);
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get(&"a"), Some(3));
//! assert_eq!(map.get_or_default(&"z", 0), 0);
//!
//! map.for_each(|key, value| {
//!     println!("{}: {}", key, value);
//! });
//!
//! let stats = map.partition_stats();
//! println!("{} keys in {} partitions", stats.keys, stats.parts);
//!
//! map.delete(&"b");
//! assert_eq!(map.to_string(), "a: 3\n");
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use partitionmap::{PartitionMapBuilder, HashFunction};
//!
//! let map = PartitionMapBuilder::new()
//!     .shard_count(64)?
//!     .hash_function(HashFunction::AHash)
//!     .capacity_per_shard(32)
//!     .build::<String, i32>()?;
//! # Ok::<(), partitionmap::Error>(())
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

/// Configuration and builder types.
pub mod config;
/// Error types.
pub mod error;
/// Key routing and table hashing.
pub mod hash;
/// Iterator implementations.
pub mod iter;
/// Main PartitionMap implementation.
pub mod partitionmap;
/// Internal partition implementation.
mod shard;
/// Statistics and metrics collection.
pub mod stats;

// Re-export main types
pub use config::{Config, HashFunction, PartitionMapBuilder, DEFAULT_SHARD_COUNT};
pub use error::Error;
pub use hash::{KeyBytes, ShardKey};
pub use partitionmap::{MaybePartitionMap, PartitionMap};
pub use stats::{PartitionStats, ShardOps};
