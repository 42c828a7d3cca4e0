//! Utility Module
//!
//! - [`interner`]: String interning for shader macro names
//! - [`hash`]: Fast hashing helpers for cache keys
//!
//! # String Interning
//!
//! Interned strings (Symbols) compare in O(1) time, which keeps define sets
//! cheap to hash and compare when keying program caches.
//!
//! ```rust,ignore
//! use stratum::utils::interner;
//!
//! let sym1 = interner::intern("_PCF");
//! let sym2 = interner::intern("_PCF");
//! assert_eq!(sym1, sym2); // O(1) comparison
//! ```

pub mod hash;
pub mod interner;

pub use hash::fx_hash_key;
pub use interner::Symbol;
