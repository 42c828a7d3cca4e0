//! Hashing helpers shared by the program cache and structural hashes.

use std::hash::{Hash, Hasher};

/// Compute a `u64` hash of any `Hash`-able value using `FxHasher`.
#[inline]
pub fn fx_hash_key<K: Hash + ?Sized>(key: &K) -> u64 {
    let mut hasher = rustc_hash::FxHasher::default();
    key.hash(&mut hasher);
    hasher.finish()
}

/// Hash a source string for module deduplication.
#[inline]
#[must_use]
pub fn source_hash(source: &str) -> u128 {
    xxhash_rust::xxh3::xxh3_128(source.as_bytes())
}
