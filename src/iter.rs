use crate::shard::Partition;
use std::hash::Hash;
use std::sync::OnceLock;

/// Iterator that walks the map one partition at a time.
///
/// When the iterator reaches an allocated partition it copies that
/// partition's entries under its read lock and then yields from the copy.
/// Each partition is seen consistently, but partitions are captured at
/// different instants, so writes racing with the walk may or may not show up.
/// Unallocated slots are skipped without being created.
pub struct SnapshotIter<'a, K, V> {
    slots: std::slice::Iter<'a, OnceLock<Partition<K, V>>>,
    buffer: std::vec::IntoIter<(K, V)>,
}

impl<'a, K, V> SnapshotIter<'a, K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub(crate) fn new(slots: &'a [OnceLock<Partition<K, V>>]) -> Self {
        Self {
            slots: slots.iter(),
            buffer: Vec::new().into_iter(),
        }
    }
}

impl<'a, K, V> Iterator for SnapshotIter<'a, K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.next() {
                return Some(item);
            }
            let slot = self.slots.next()?;
            if let Some(partition) = slot.get() {
                self.buffer = partition.snapshot().into_iter();
            }
        }
    }
}
