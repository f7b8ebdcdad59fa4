//! # keymorph
//!
//! An insertion-ordered map that normalizes every key through a
//! caller-supplied transform function before storage or lookup.
//!
//! ## Overview
//!
//! [`TransformMap`] lets callers treat semantically equivalent keys
//! (`"Foo"`, `"foo"`, `"FOO"` under a lowercasing transform) as the same
//! storage slot, enabling case-insensitive, whitespace-normalized, or
//! format-converting maps without callers managing normalization
//! themselves. It provides:
//!
//! - **Transform-on-access**: every key-accepting operation runs the key
//!   through the shared transform function first.
//! - **Key styles**: expose transformed keys, or retain and expose the
//!   original key of the most recent store ([`KeyStyle`]).
//! - **Default machinery**: a static default value, or a default
//!   function that may mutate the map during a read (auto-vivification).
//! - **Derived operations**: `filter`, `reject`, `compact`, `except`,
//!   `slice`, `merge`, `invert`, `transform_values` — each producing an
//!   independent map sharing the source's transform function.
//! - **Comparison**: structural equality over transformed keys and the
//!   subset partial order, plus an opt-in reference-identity mode
//!   ([`Identical`]).
//!
//! ## Feature Flags
//!
//! - `serde`: `Serialize`/`Deserialize` for [`TransformMap`].
//!
//! ## Example
//!
//! ```rust
//! use keymorph::TransformMap;
//!
//! let mut map = TransformMap::with_transform(|key: &String| key.to_lowercase());
//! map.insert("Foo".to_string(), 1);
//! map.insert("BAR".to_string(), 2);
//!
//! assert_eq!(map.get(&"foo".to_string()), Some(&1));
//! assert_eq!(map.get(&"Bar".to_string()), Some(&2));
//!
//! let odd = map.filter(|_, value| value % 2 == 1);
//! assert_eq!(odd.len(), 1);
//! assert!(odd.shares_transform(&map));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod identity;
mod map;
mod source;
mod store;
mod transform;

pub use error::TransformMapError;
pub use identity::Identical;
pub use map::{Entries, IntoIter, Iter, KeyStyle, Keys, TransformMap, Values};
pub use source::ToPairs;
pub use transform::Transform;

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use keymorph::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Identical, KeyStyle, ToPairs, Transform, TransformMap, TransformMapError};
}
