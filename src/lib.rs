#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// A separate-chaining hash table.
///
/// This module provides the `HashTable` engine: bucket storage, per-bucket
/// chains, duplicate-key rejection and load-factor driven rehashing.
pub mod hash_table;

/// Built-in hash functions for primitive key types.
///
/// Any `Fn(&K) -> u64` can be handed to [`HashTable`]; the functions here are
/// ready-made choices for the common cases.
pub mod hash_fn;

/// Error types.
pub mod error;

pub use error::Result;
pub use error::TableError;
pub use hash_table::DefaultHashTable;
pub use hash_table::GrowthPolicy;
pub use hash_table::HashTable;
pub use hash_table::TableOptions;
#[cfg(any(test, feature = "stats"))]
pub use hash_table::TableStats;
