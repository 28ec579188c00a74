//! Key-to-slot routing and the hasher used inside each partition's table.
//!
//! Routing is a closed two-way split. Integer keys (up to 128 bits) are
//! reduced modulo the slot count directly; every other key kind is rendered
//! to a canonical byte form and reduced through a CRC32C checksum. A collision between two
//! distinct keys only means they share a partition lock.

use std::borrow::Cow;
use std::hash::{BuildHasher, Hasher};

/// Canonical routing representation of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyBytes<'a> {
    /// Integer keys, reinterpreted as `u64` (negative values sign-extend).
    Int(u64),
    /// 128-bit integer keys, reinterpreted as `u128`.
    Wide(u128),
    /// Any other key, as the bytes fed to the checksum.
    Bytes(Cow<'a, [u8]>),
}

/// Keys that can be routed to a partition slot.
///
/// Implementations must be pure: the same key always yields the same
/// representation for the lifetime of the process.
pub trait ShardKey {
    /// Routing representation of this key.
    fn key_bytes(&self) -> KeyBytes<'_>;
}

macro_rules! impl_int_key {
    ($($t:ty),* $(,)?) => {
        $(
            impl ShardKey for $t {
                #[inline]
                fn key_bytes(&self) -> KeyBytes<'_> {
                    KeyBytes::Int(*self as u64)
                }
            }
        )*
    };
}

impl_int_key!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl ShardKey for u128 {
    #[inline]
    fn key_bytes(&self) -> KeyBytes<'_> {
        KeyBytes::Wide(*self)
    }
}

impl ShardKey for i128 {
    #[inline]
    fn key_bytes(&self) -> KeyBytes<'_> {
        KeyBytes::Wide(*self as u128)
    }
}

impl ShardKey for str {
    #[inline]
    fn key_bytes(&self) -> KeyBytes<'_> {
        KeyBytes::Bytes(Cow::Borrowed(self.as_bytes()))
    }
}

impl ShardKey for String {
    #[inline]
    fn key_bytes(&self) -> KeyBytes<'_> {
        self.as_str().key_bytes()
    }
}

impl ShardKey for char {
    fn key_bytes(&self) -> KeyBytes<'_> {
        let mut buf = [0u8; 4];
        let encoded = self.encode_utf8(&mut buf);
        KeyBytes::Bytes(Cow::Owned(encoded.as_bytes().to_vec()))
    }
}

impl ShardKey for bool {
    fn key_bytes(&self) -> KeyBytes<'_> {
        let text: &'static str = if *self { "true" } else { "false" };
        KeyBytes::Bytes(Cow::Borrowed(text.as_bytes()))
    }
}

// Shortest round-trip decimal, never in exponent notation.
impl ShardKey for f32 {
    fn key_bytes(&self) -> KeyBytes<'_> {
        KeyBytes::Bytes(Cow::Owned(self.to_string().into_bytes()))
    }
}

impl ShardKey for f64 {
    fn key_bytes(&self) -> KeyBytes<'_> {
        KeyBytes::Bytes(Cow::Owned(self.to_string().into_bytes()))
    }
}

impl<T: ShardKey + ?Sized> ShardKey for &T {
    #[inline]
    fn key_bytes(&self) -> KeyBytes<'_> {
        (**self).key_bytes()
    }
}

/// Compute the slot index in `[0, slot_count)` for `key`.
///
/// `slot_count` must be non-zero; `PartitionMap` guarantees this at
/// construction.
#[inline]
pub fn slot_index<K: ShardKey + ?Sized>(key: &K, slot_count: usize) -> usize {
    let reduced = match key.key_bytes() {
        KeyBytes::Int(value) => value % slot_count as u64,
        KeyBytes::Wide(value) => (value % slot_count as u128) as u64,
        KeyBytes::Bytes(bytes) => u64::from(crc32c::crc32c(&bytes)) % slot_count as u64,
    };
    reduced as usize
}

/// Hasher builder for the table inside each partition.
///
/// Uses an enum to keep the partition type independent of the configured
/// hash function.
#[derive(Clone)]
pub enum TableHasher {
    /// AHash implementation (default, fast and well-distributed).
    AHash(ahash::RandomState),
    /// FxHash implementation (faster but potentially less distributed).
    #[cfg(feature = "fxhash")]
    FxHash,
}

impl Default for TableHasher {
    fn default() -> Self {
        TableHasher::AHash(ahash::RandomState::new())
    }
}

impl BuildHasher for TableHasher {
    type Hasher = TableHasherState;

    fn build_hasher(&self) -> Self::Hasher {
        match self {
            TableHasher::AHash(state) => TableHasherState::AHash(state.build_hasher()),
            #[cfg(feature = "fxhash")]
            TableHasher::FxHash => TableHasherState::FxHash(fxhash::FxHasher::default()),
        }
    }
}

/// Running state of a [`TableHasher`].
pub enum TableHasherState {
    /// AHash state.
    AHash(ahash::AHasher),
    /// FxHash state.
    #[cfg(feature = "fxhash")]
    FxHash(fxhash::FxHasher),
}

impl Hasher for TableHasherState {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        match self {
            TableHasherState::AHash(hasher) => hasher.write(bytes),
            #[cfg(feature = "fxhash")]
            TableHasherState::FxHash(hasher) => hasher.write(bytes),
        }
    }

    #[inline]
    fn write_u64(&mut self, value: u64) {
        match self {
            TableHasherState::AHash(hasher) => hasher.write_u64(value),
            #[cfg(feature = "fxhash")]
            TableHasherState::FxHash(hasher) => hasher.write_u64(value),
        }
    }

    #[inline]
    fn write_usize(&mut self, value: usize) {
        match self {
            TableHasherState::AHash(hasher) => hasher.write_usize(value),
            #[cfg(feature = "fxhash")]
            TableHasherState::FxHash(hasher) => hasher.write_usize(value),
        }
    }

    #[inline]
    fn finish(&self) -> u64 {
        match self {
            TableHasherState::AHash(hasher) => hasher.finish(),
            #[cfg(feature = "fxhash")]
            TableHasherState::FxHash(hasher) => hasher.finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_fast_path() {
        assert_eq!(slot_index(&5u32, 128), 5);
        assert_eq!(slot_index(&130i64, 128), 2);
        assert_eq!(slot_index(&0usize, 64), 0);
        assert_eq!(slot_index(&(-1i32), 128), (u64::MAX % 128) as usize);
    }

    #[test]
    fn test_wide_integer_fast_path() {
        assert_eq!(slot_index(&300u128, 128), 300 % 128);
        let wide = u64::MAX as u128 + 5;
        assert_eq!(slot_index(&wide, 64), (wide % 64) as usize);
        assert_eq!(slot_index(&(-1i128), 128), (u128::MAX % 128) as usize);
        assert_eq!(slot_index(&7i128, 128), slot_index(&7u64, 128));
    }

    #[test]
    fn test_text_uses_crc32c() {
        let expected = (crc32c::crc32c(b"hello") % 64) as usize;
        assert_eq!(slot_index("hello", 64), expected);
        assert_eq!(slot_index(&"hello".to_string(), 64), expected);
        assert_eq!(slot_index(&"hello", 64), expected);
    }

    #[test]
    fn test_float_and_misc_keys_render_as_text() {
        assert_eq!(
            slot_index(&1.5f64, 128),
            (crc32c::crc32c(b"1.5") % 128) as usize
        );
        assert_eq!(
            slot_index(&0.1f32, 128),
            (crc32c::crc32c(b"0.1") % 128) as usize
        );
        assert_eq!(
            slot_index(&true, 128),
            (crc32c::crc32c(b"true") % 128) as usize
        );
        assert_eq!(slot_index(&'a', 128), slot_index("a", 128));
    }

    #[test]
    fn test_slot_index_is_deterministic() {
        for i in 0..1000 {
            let key = format!("key_{}", i);
            let first = slot_index(&key, 128);
            assert!(first < 128);
            assert_eq!(first, slot_index(&key, 128));
        }
    }

    #[test]
    fn test_table_hasher_is_stable_per_builder() {
        let builder = TableHasher::default();
        let mut a = builder.build_hasher();
        let mut b = builder.build_hasher();
        a.write(b"same");
        b.write(b"same");
        assert_eq!(a.finish(), b.finish());
    }
}
