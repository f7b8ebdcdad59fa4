//! Error types for fallible container operations.
//!
//! The container is total for ordinary reads and writes; only strict
//! lookups and malformed construction shapes can fail. Caller-supplied
//! transform functions and closures may panic, and those panics propagate
//! unmodified.

use thiserror::Error;

/// Errors produced by [`TransformMap`](crate::TransformMap) operations.
///
/// Carries the key type so that a failed strict lookup can report the
/// transformed key it searched for.
///
/// # Examples
///
/// ```rust
/// use keymorph::{TransformMap, TransformMapError};
///
/// let map: TransformMap<String, i32> = TransformMap::new();
/// let missing = map.fetch(&"absent".to_string());
/// assert_eq!(
///     missing,
///     Err(TransformMapError::KeyNotFound("absent".to_string()))
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformMapError<K> {
    /// A flat alternating key/value sequence had an odd number of items.
    #[error("odd number of items for flat key/value construction: {count}")]
    InvalidArgument {
        /// The offending item count.
        count: usize,
    },

    /// A strict lookup found no entry for the transformed key.
    #[error("key not found: {0:?}")]
    KeyNotFound(K),
}
