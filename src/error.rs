use alloc::collections::TryReserveError;

use thiserror::Error;

/// Errors returned by [`HashTable`](crate::HashTable) operations.
///
/// A lookup miss is not an error; [`get`](crate::HashTable::get) returns
/// `None` for it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A key comparing equal to the inserted one is already stored. The table
    /// is left untouched.
    #[error("key already present in table")]
    DuplicateKey,

    /// Memory for buckets or chains could not be obtained. The table is left
    /// in its pre-call state.
    #[error("allocation failed: {0}")]
    ResourceExhausted(#[from] TryReserveError),

    /// A capacity doubling would overflow `usize`.
    #[error("capacity overflow while growing {0}")]
    CapacityOverflow(&'static str),

    /// The supplied [`TableOptions`](crate::TableOptions) cannot describe a
    /// working table.
    #[error("invalid table options: {0}")]
    InvalidOptions(&'static str),
}

/// Result type used throughout the crate.
pub type Result<T> = core::result::Result<T, TableError>;
