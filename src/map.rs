//! Insertion-ordered map with transform-on-access key semantics.
//!
//! This module provides [`TransformMap`], a mutable associative container
//! that routes every key through a caller-supplied transform function
//! before storage or lookup, so semantically equivalent keys (`"Foo"`,
//! `"foo"`, `"FOO"` under a lowercasing transform) address the same slot.
//!
//! # Overview
//!
//! - Every key-accepting operation transforms the key first, then
//!   consults the entry store.
//! - Entries keep the first-insertion order of their transformed key;
//!   updates never move an entry.
//! - The original (pre-transform) key of the most recent store is kept
//!   alongside each value; [`KeyStyle::Retained`] exposes it instead of
//!   the transformed key.
//! - Derived maps (`filter`, `merge`, `except`, ...) share the transform
//!   function with their source but own independent storage.
//!
//! # Examples
//!
//! ```rust
//! use keymorph::TransformMap;
//!
//! let mut map = TransformMap::with_transform(|key: &String| key.to_lowercase());
//! map.insert("Foo".to_string(), 1);
//! map.insert("BAR".to_string(), 2);
//!
//! assert_eq!(map.get(&"foo".to_string()), Some(&1));
//! assert_eq!(map.get(&"bar".to_string()), Some(&2));
//! assert_eq!(
//!     map.keys().collect::<Vec<_>>(),
//!     [&"foo".to_string(), &"bar".to_string()]
//! );
//! ```

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::TransformMapError;
use crate::identity::{Identical, identical};
use crate::source::ToPairs;
use crate::store::{EntryStore, StoreIntoIter, StoreIter};
use crate::transform::Transform;

// =============================================================================
// Configuration
// =============================================================================

/// Which key representation a map exposes through iteration, display,
/// and plain-mapping conversion.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KeyStyle {
    /// Expose the transformed key everywhere.
    Transformed,
    /// Expose the original key from the most recent store of each
    /// transformed key (last write wins, not first).
    Retained,
}

type DefaultFn<K, V> = dyn Fn(&mut TransformMap<K, V>, &K) -> V;

/// Resolution for lookups that miss, carried per map instance.
enum DefaultPolicy<K, V> {
    None,
    Value(V),
    Function(Rc<DefaultFn<K, V>>),
}

impl<K, V: Clone> Clone for DefaultPolicy<K, V> {
    fn clone(&self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Value(value) => Self::Value(value.clone()),
            Self::Function(function) => Self::Function(Rc::clone(function)),
        }
    }
}

// =============================================================================
// TransformMap Definition
// =============================================================================

/// An insertion-ordered map that normalizes every key through a transform
/// function before storage or lookup.
///
/// The transform function is supplied once at construction and shared (by
/// reference) with every map derived from this one. Two maps compare
/// equal based on their transformed-key/value contents only, never on
/// which function they hold.
///
/// # Time Complexity
///
/// | Operation      | Equality mode | Identity mode |
/// |----------------|---------------|---------------|
/// | `get`          | O(1)*         | O(n)          |
/// | `insert`       | O(1)*         | O(n)          |
/// | `remove`       | O(n)          | O(n)          |
/// | `contains_key` | O(1)*         | O(n)          |
/// | `len`          | O(1)          | O(1)          |
///
/// \* amortized, plus one call of the transform function. `remove` is
/// O(n) because insertion order of the remaining entries is preserved.
///
/// # Examples
///
/// ```rust
/// use keymorph::TransformMap;
///
/// let mut headers = TransformMap::with_transform(|name: &String| name.to_ascii_lowercase());
/// headers.insert("Content-Type".to_string(), "text/plain");
/// assert!(headers.contains_key(&"CONTENT-TYPE".to_string()));
/// ```
pub struct TransformMap<K, V> {
    store: EntryStore<K, V>,
    transform: Transform<K>,
    default: DefaultPolicy<K, V>,
    style: KeyStyle,
}

impl<K, V> TransformMap<K, V> {
    /// Creates an empty map with the identity transform, exposing
    /// transformed (here: unchanged) keys.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: EntryStore::new(),
            transform: Transform::identity(),
            default: DefaultPolicy::None,
            style: KeyStyle::Transformed,
        }
    }

    /// Creates an empty map bound to a transform function, exposing the
    /// transformed keys.
    ///
    /// The function must be deterministic: every equality guarantee of
    /// the map is stated over transformed keys.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keymorph::TransformMap;
    ///
    /// let mut map = TransformMap::with_transform(|key: &String| key.trim().to_string());
    /// map.insert("  padded  ".to_string(), 1);
    /// assert_eq!(map.get(&"padded".to_string()), Some(&1));
    /// ```
    #[must_use]
    pub fn with_transform(function: impl Fn(&K) -> K + 'static) -> Self {
        Self {
            store: EntryStore::new(),
            transform: Transform::new(function),
            default: DefaultPolicy::None,
            style: KeyStyle::Transformed,
        }
    }

    /// Creates an empty map bound to a transform function that exposes
    /// *original* keys: iteration, display, and conversion show the key
    /// most recently used to store each entry, while lookups still go
    /// through the transform.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keymorph::TransformMap;
    ///
    /// let mut map = TransformMap::retaining(|key: &String| key.to_lowercase());
    /// map.insert("Foo".to_string(), 1);
    ///
    /// assert_eq!(map.get(&"FOO".to_string()), Some(&1));
    /// assert_eq!(map.keys().collect::<Vec<_>>(), [&"Foo".to_string()]);
    /// ```
    #[must_use]
    pub fn retaining(function: impl Fn(&K) -> K + 'static) -> Self {
        Self {
            store: EntryStore::new(),
            transform: Transform::new(function),
            default: DefaultPolicy::None,
            style: KeyStyle::Retained,
        }
    }

    /// Creates an empty map with the identity transform that exposes
    /// original keys. Since the identity transform leaves keys
    /// untouched, the two representations only diverge once a lookup
    /// key and a stored key differ by identity (see
    /// [`compare_by_identity`](Self::compare_by_identity)).
    #[must_use]
    pub fn retaining_identity() -> Self {
        Self {
            store: EntryStore::new(),
            transform: Transform::identity(),
            default: DefaultPolicy::None,
            style: KeyStyle::Retained,
        }
    }

    /// Sets a static default value returned by
    /// [`get_or_default`](Self::get_or_default) for missing keys.
    #[must_use]
    pub fn with_default(mut self, value: V) -> Self {
        self.default = DefaultPolicy::Value(value);
        self
    }

    /// Sets a default function invoked by
    /// [`get_or_default`](Self::get_or_default) for missing keys.
    ///
    /// The function receives the map itself (mutably, so it may store
    /// entries) and the *transformed* key. Its result is returned to the
    /// caller but is **not** stored unless the function stores it.
    ///
    /// # Examples
    ///
    /// Auto-vivification, where the default function stores what it
    /// returns:
    ///
    /// ```rust
    /// use keymorph::TransformMap;
    ///
    /// let mut map = TransformMap::with_transform(|key: &String| key.to_lowercase())
    ///     .with_default_fn(|map, key| {
    ///         map.insert(key.clone(), 0);
    ///         0
    ///     });
    ///
    /// assert_eq!(map.get_or_default(&"Hits".to_string()), Some(0));
    /// assert!(map.contains_key(&"hits".to_string()));
    /// ```
    #[must_use]
    pub fn with_default_fn(mut self, function: impl Fn(&mut Self, &K) -> V + 'static) -> Self {
        self.default = DefaultPolicy::Function(Rc::new(function));
        self
    }

    /// Replaces the default policy with a static value.
    pub fn set_default(&mut self, value: V) {
        self.default = DefaultPolicy::Value(value);
    }

    /// Replaces the default policy with a default function. See
    /// [`with_default_fn`](Self::with_default_fn).
    pub fn set_default_fn(&mut self, function: impl Fn(&mut Self, &K) -> V + 'static) {
        self.default = DefaultPolicy::Function(Rc::new(function));
    }

    /// The static default value, if one is set.
    #[must_use]
    pub fn default_value(&self) -> Option<&V> {
        match &self.default {
            DefaultPolicy::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The key representation this map exposes.
    #[inline]
    #[must_use]
    pub const fn key_style(&self) -> KeyStyle {
        self.style
    }

    /// The transform function of this map.
    #[inline]
    #[must_use]
    pub const fn transform(&self) -> &Transform<K> {
        &self.transform
    }

    /// Returns `true` if both maps hold the same transform function
    /// value (identity, or the same shared allocation). Derived maps
    /// always share their source's transform.
    #[must_use]
    pub fn shares_transform<V2>(&self, other: &TransformMap<K, V2>) -> bool {
        self.transform.same_function(&other.transform)
    }

    /// The number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if the map has no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Removes every entry, keeping the transform function, default
    /// policy, and comparison mode.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Returns `true` if the entry store compares keys by identity. See
    /// [`compare_by_identity`](Self::compare_by_identity).
    #[must_use]
    pub fn compares_by_identity(&self) -> bool {
        self.store.compares_by_identity()
    }

    /// Iterates over `(exposed key, value)` pairs in insertion order of
    /// the transformed key.
    ///
    /// The iterator is lazy and restartable; calling `iter` again yields
    /// a fresh pass.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.store.iter(),
            style: self.style,
        }
    }

    /// Iterates over `(transformed key, original key, value)` triples in
    /// insertion order.
    ///
    /// The original key is whichever key was used in the most recent
    /// store for that transformed key.
    #[must_use]
    pub fn entries(&self) -> Entries<'_, K, V> {
        Entries {
            inner: self.store.iter(),
        }
    }

    /// Iterates over exposed keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Iterates over values in insertion order.
    #[must_use]
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

impl<K, V> Default for TransformMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone> Clone for TransformMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            transform: self.transform.clone(),
            default: self.default.clone(),
            style: self.style,
        }
    }
}

// =============================================================================
// Point access and mutation
// =============================================================================

impl<K: Clone + Hash + Eq, V> TransformMap<K, V> {
    /// Transforms the key and returns a reference to its value, or
    /// `None` if absent. The default policy is not consulted; see
    /// [`get_or_default`](Self::get_or_default).
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        let transformed = self.transform.apply(key);
        self.store.get(&transformed).map(|slot| &slot.value)
    }

    /// Transforms the key and returns a mutable reference to its value.
    #[must_use]
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let transformed = self.transform.apply(key);
        self.store.get_mut(&transformed).map(|slot| &mut slot.value)
    }

    /// Transforms the key, then inserts or updates the entry, returning
    /// the displaced value.
    ///
    /// An update keeps the entry's insertion-order position and
    /// overwrites its retained original key with `key`.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let transformed = self.transform.apply(&key);
        self.store.insert(transformed, key, value)
    }

    /// Transforms the key and removes its entry, returning the value if
    /// one was present. The remaining entries keep their order.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let transformed = self.transform.apply(key);
        self.store.remove(&transformed).map(|slot| slot.value)
    }

    /// Like [`remove`](Self::remove), but a missing key resolves through
    /// the fallback function, which receives the transformed key.
    pub fn remove_or_else(&mut self, key: &K, fallback: impl FnOnce(&K) -> V) -> V {
        let transformed = self.transform.apply(key);
        match self.store.remove(&transformed) {
            Some(slot) => slot.value,
            None => fallback(&transformed),
        }
    }

    /// Transforms the key and reports whether an entry exists for it.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        let transformed = self.transform.apply(key);
        self.store.get(&transformed).is_some()
    }

    /// Strict lookup: transforms the key and returns its value, or a
    /// [`TransformMapError::KeyNotFound`] naming the transformed key.
    ///
    /// # Errors
    ///
    /// Returns [`TransformMapError::KeyNotFound`] if no entry exists for
    /// the transformed key.
    pub fn fetch(&self, key: &K) -> Result<&V, TransformMapError<K>> {
        let transformed = self.transform.apply(key);
        match self.store.get(&transformed) {
            Some(slot) => Ok(&slot.value),
            None => Err(TransformMapError::KeyNotFound(transformed)),
        }
    }

    /// Lookup with a fallback value for missing keys. Never consults the
    /// default policy.
    #[must_use]
    pub fn fetch_or(&self, key: &K, fallback: V) -> V
    where
        V: Clone,
    {
        self.get(key).cloned().unwrap_or(fallback)
    }

    /// Lookup with a fallback function for missing keys; the function
    /// receives the transformed key.
    pub fn fetch_with(&self, key: &K, fallback: impl FnOnce(&K) -> V) -> V
    where
        V: Clone,
    {
        let transformed = self.transform.apply(key);
        match self.store.get(&transformed) {
            Some(slot) => slot.value.clone(),
            None => fallback(&transformed),
        }
    }

    /// Transforms the key and returns its value, falling back to the
    /// map's default policy on a miss.
    ///
    /// A default *function* receives the map mutably and the transformed
    /// key; it may store entries (auto-vivification), and its result is
    /// returned but not stored automatically. With no default policy a
    /// miss yields `None`.
    pub fn get_or_default(&mut self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let transformed = self.transform.apply(key);
        if let Some(slot) = self.store.get(&transformed) {
            return Some(slot.value.clone());
        }
        match &self.default {
            DefaultPolicy::None => None,
            DefaultPolicy::Value(value) => Some(value.clone()),
            DefaultPolicy::Function(function) => {
                let function = Rc::clone(function);
                Some(function(self, &transformed))
            }
        }
    }

    /// Looks up each given key with [`get_or_default`](Self::get_or_default),
    /// in the order given. Missing keys without a default produce `None`.
    pub fn values_at<I>(&mut self, keys: I) -> Vec<Option<V>>
    where
        I: IntoIterator,
        I::Item: Borrow<K>,
        V: Clone,
    {
        keys.into_iter()
            .map(|key| self.get_or_default(key.borrow()))
            .collect()
    }

    /// Switches key comparison to reference identity.
    ///
    /// Lookups still transform the key first, but two transformed keys
    /// only address the same slot when they are the same identity (see
    /// [`Identical`]): equal-but-distinct keys become distinct entries.
    /// Existing entries keep their order. The mode is carried by the
    /// entry store and propagates to derived maps, like the transform
    /// function. Lookups in this mode are linear scans.
    ///
    /// [`Identical`] is implemented for shared pointers (`Rc`, `Arc`)
    /// and small scalar types, not for owned types like `String`, where
    /// the mode has no meaningful identity to compare. Maps keyed by
    /// owned strings should wrap them in `Rc<str>` to use this mode.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::rc::Rc;
    /// use keymorph::TransformMap;
    ///
    /// let first: Rc<str> = Rc::from("key");
    /// let second: Rc<str> = Rc::from("key");
    ///
    /// let mut map: TransformMap<Rc<str>, i32> = TransformMap::new();
    /// map.compare_by_identity();
    ///
    /// map.insert(Rc::clone(&first), 1);
    /// map.insert(Rc::clone(&second), 2);
    /// assert_eq!(map.len(), 2);
    /// assert_eq!(map.get(&first), Some(&1));
    /// ```
    pub fn compare_by_identity(&mut self)
    where
        K: Identical,
    {
        self.store.switch_to_identity(identical::<K>);
    }

    /// A single-argument lookup function borrowing this map.
    ///
    /// Equivalent to calling [`get`](Self::get); every call reads the
    /// map's state at call time.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keymorph::TransformMap;
    ///
    /// let mut map = TransformMap::with_transform(|key: &String| key.to_lowercase());
    /// map.insert("Foo".to_string(), 1);
    ///
    /// let lookup = map.as_fn();
    /// assert_eq!(lookup(&"FOO".to_string()), Some(&1));
    /// ```
    pub fn as_fn<'map>(&'map self) -> impl Fn(&K) -> Option<&'map V> {
        move |key| self.get(key)
    }

    /// Converts to the plain ordered-mapping primitive, using the
    /// exposed key representation in insertion order.
    ///
    /// The result is an independent copy; mutating it does not affect
    /// this map.
    #[must_use]
    pub fn to_index_map(&self) -> IndexMap<K, V>
    where
        V: Clone,
    {
        self.iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

// =============================================================================
// Bulk construction
// =============================================================================

impl<K: Clone + Hash + Eq, V> TransformMap<K, V> {
    /// Builds an identity-transform map from any ordered pair source.
    #[must_use]
    pub fn from_source<S>(source: &S) -> Self
    where
        S: ToPairs<K, V> + ?Sized,
    {
        let mut map = Self::new();
        for (key, value) in source.to_pairs() {
            map.insert(key, value);
        }
        map
    }

    /// Builds a map from any ordered pair source, re-keying every pair
    /// through the given transform function.
    ///
    /// When the source is another `TransformMap`, its exposed keys are
    /// treated as a plain mapping and re-normalized through `function`.
    /// Copying a map while reusing its transform is [`Clone`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keymorph::TransformMap;
    ///
    /// let pairs = [("Foo".to_string(), 1), ("BAR".to_string(), 2)];
    /// let map = TransformMap::from_source_with(&pairs, |key: &String| key.to_lowercase());
    ///
    /// assert_eq!(map.get(&"foo".to_string()), Some(&1));
    /// assert_eq!(map.get(&"Bar".to_string()), Some(&2));
    /// ```
    #[must_use]
    pub fn from_source_with<S>(source: &S, function: impl Fn(&K) -> K + 'static) -> Self
    where
        S: ToPairs<K, V> + ?Sized,
    {
        let mut map = Self::with_transform(function);
        for (key, value) in source.to_pairs() {
            map.insert(key, value);
        }
        map
    }

    /// Like [`from_source_with`](Self::from_source_with), but the built
    /// map exposes original keys: each pair's key is stored under its
    /// transformed form while its given spelling is retained.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keymorph::TransformMap;
    ///
    /// let pairs = [("Foo".to_string(), 1)];
    /// let map = TransformMap::retaining_from_source_with(&pairs, |key: &String| key.to_lowercase());
    ///
    /// assert_eq!(map.get(&"FOO".to_string()), Some(&1));
    /// assert_eq!(map.keys().collect::<Vec<_>>(), [&"Foo".to_string()]);
    /// ```
    #[must_use]
    pub fn retaining_from_source_with<S>(source: &S, function: impl Fn(&K) -> K + 'static) -> Self
    where
        S: ToPairs<K, V> + ?Sized,
    {
        let mut map = Self::retaining(function);
        for (key, value) in source.to_pairs() {
            map.insert(key, value);
        }
        map
    }
}

impl<T: Clone + Hash + Eq> TransformMap<T, T> {
    /// Builds an identity-transform map from a flat sequence of
    /// alternating keys and values.
    ///
    /// # Errors
    ///
    /// Returns [`TransformMapError::InvalidArgument`] naming the item
    /// count if the sequence has odd length.
    pub fn from_alternating<I>(items: I) -> Result<Self, TransformMapError<T>>
    where
        I: IntoIterator<Item = T>,
    {
        Self::from_alternating_into(items, Self::new())
    }

    /// Builds a map from a flat alternating key/value sequence, bound to
    /// the given transform function.
    ///
    /// # Errors
    ///
    /// Returns [`TransformMapError::InvalidArgument`] naming the item
    /// count if the sequence has odd length.
    pub fn from_alternating_with<I>(
        items: I,
        function: impl Fn(&T) -> T + 'static,
    ) -> Result<Self, TransformMapError<T>>
    where
        I: IntoIterator<Item = T>,
    {
        Self::from_alternating_into(items, Self::with_transform(function))
    }

    fn from_alternating_into<I>(items: I, mut map: Self) -> Result<Self, TransformMapError<T>>
    where
        I: IntoIterator<Item = T>,
    {
        let items: Vec<T> = items.into_iter().collect();
        if items.len() % 2 != 0 {
            return Err(TransformMapError::InvalidArgument { count: items.len() });
        }
        let mut items = items.into_iter();
        while let (Some(key), Some(value)) = (items.next(), items.next()) {
            map.insert(key, value);
        }
        Ok(map)
    }

    /// A new map whose entries are `(transform(old value), old exposed
    /// key)`: values become keys and are normalized through this map's
    /// transform function. If two values transform to the same key, the
    /// later entry wins.
    #[must_use]
    pub fn invert(&self) -> Self {
        let mut inverted = self.derived_empty();
        for (transformed, slot) in self.store.iter() {
            let new_key = self.transform.apply(&slot.value);
            let old_key = match self.style {
                KeyStyle::Transformed => transformed.clone(),
                KeyStyle::Retained => slot.original.clone(),
            };
            inverted.store.insert(new_key, slot.value.clone(), old_key);
        }
        inverted
    }
}

// =============================================================================
// Derived operations
// =============================================================================

impl<K: Clone + Hash + Eq, V: Clone> TransformMap<K, V> {
    /// An empty map with this map's transform function, default policy,
    /// key style, and comparison mode. Every derived operation starts
    /// here, so derived maps never share mutable storage with their
    /// source.
    fn derived_empty(&self) -> Self {
        Self {
            store: self.store.fresh(),
            transform: self.transform.clone(),
            default: self.default.clone(),
            style: self.style,
        }
    }

    /// A new map with the entries for which the predicate returns
    /// `true`. The predicate receives the transformed key and the value.
    ///
    /// The result owns independent storage: mutating this map afterwards
    /// does not affect the filtered map, and vice versa.
    #[must_use]
    pub fn filter(&self, mut predicate: impl FnMut(&K, &V) -> bool) -> Self {
        let mut kept = self.derived_empty();
        for (transformed, slot) in self.store.iter() {
            if predicate(transformed, &slot.value) {
                kept.store
                    .insert(transformed.clone(), slot.original.clone(), slot.value.clone());
            }
        }
        kept
    }

    /// Complement of [`filter`](Self::filter): a new map with the
    /// entries for which the predicate returns `false`.
    #[must_use]
    pub fn reject(&self, mut predicate: impl FnMut(&K, &V) -> bool) -> Self {
        self.filter(|key, value| !predicate(key, value))
    }

    /// Keeps only the entries satisfying the predicate, in place.
    pub fn retain(&mut self, mut predicate: impl FnMut(&K, &V) -> bool) {
        self.store.retain(|key, slot| predicate(key, &slot.value));
    }

    /// In-place [`filter`](Self::filter); returns whether any entry was
    /// removed, so callers can distinguish "changed" from "unchanged".
    pub fn select_mut(&mut self, mut predicate: impl FnMut(&K, &V) -> bool) -> bool {
        self.store.retain(|key, slot| predicate(key, &slot.value)) > 0
    }

    /// In-place [`reject`](Self::reject); returns whether any entry was
    /// removed.
    pub fn reject_mut(&mut self, mut predicate: impl FnMut(&K, &V) -> bool) -> bool {
        self.store.retain(|key, slot| !predicate(key, &slot.value)) > 0
    }

    /// A new map omitting the given keys. The keys are transformed
    /// before comparison.
    #[must_use]
    pub fn except<I>(&self, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Borrow<K>,
    {
        let omitted: Vec<K> = keys
            .into_iter()
            .map(|key| self.transform.apply(key.borrow()))
            .collect();
        self.filter(|transformed, _| !omitted.contains(transformed))
    }

    /// A new map containing only the entries for the given keys, in the
    /// order the keys are given. The keys are transformed before
    /// comparison; missing keys are silently skipped.
    #[must_use]
    pub fn slice<I>(&self, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Borrow<K>,
    {
        let mut taken = self.derived_empty();
        for key in keys {
            let transformed = self.transform.apply(key.borrow());
            if let Some(slot) = self.store.get(&transformed) {
                taken
                    .store
                    .insert(transformed, slot.original.clone(), slot.value.clone());
            }
        }
        taken
    }

    /// A copy of this map merged with the given sources, later sources
    /// overwriting earlier ones and this map.
    ///
    /// Every incoming key is re-transformed through *this* map's
    /// transform function, not the source's, so merging maps with
    /// different transforms re-normalizes everything to the receiver's
    /// strategy. With no sources this is a plain copy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use keymorph::TransformMap;
    ///
    /// let mut lower = TransformMap::with_transform(|key: &String| key.to_lowercase());
    /// lower.insert("Foo".to_string(), 1);
    ///
    /// let mut upper = TransformMap::with_transform(|key: &String| key.to_uppercase());
    /// upper.insert("bar".to_string(), 2);
    ///
    /// let merged = lower.merge([&upper]);
    /// assert_eq!(merged.get(&"BAR".to_string()), Some(&2));
    /// assert_eq!(
    ///     merged.keys().collect::<Vec<_>>(),
    ///     [&"foo".to_string(), &"bar".to_string()]
    /// );
    /// ```
    #[must_use]
    pub fn merge<'s, S, I>(&self, sources: I) -> Self
    where
        S: ToPairs<K, V> + ?Sized + 's,
        I: IntoIterator<Item = &'s S>,
    {
        let mut merged = self.clone();
        merged.merge_from(sources);
        merged
    }

    /// Like [`merge`](Self::merge), resolving collisions with a conflict
    /// function `(transformed key, current value, incoming value)`.
    ///
    /// The function runs once per colliding key in left-to-right source
    /// order, chained against the running result. With no sources it is
    /// never invoked.
    #[must_use]
    pub fn merge_with<'s, S, I, F>(&self, sources: I, conflict: F) -> Self
    where
        S: ToPairs<K, V> + ?Sized + 's,
        I: IntoIterator<Item = &'s S>,
        F: FnMut(&K, &V, &V) -> V,
    {
        let mut merged = self.clone();
        merged.merge_from_with(sources, conflict);
        merged
    }

    /// Merges the given sources into this map in place, later sources
    /// overwriting earlier ones. Incoming keys are re-transformed
    /// through this map's transform function.
    pub fn merge_from<'s, S, I>(&mut self, sources: I)
    where
        S: ToPairs<K, V> + ?Sized + 's,
        I: IntoIterator<Item = &'s S>,
    {
        for source in sources {
            for (key, value) in source.to_pairs() {
                self.insert(key, value);
            }
        }
    }

    /// In-place [`merge_with`](Self::merge_with).
    pub fn merge_from_with<'s, S, I, F>(&mut self, sources: I, mut conflict: F)
    where
        S: ToPairs<K, V> + ?Sized + 's,
        I: IntoIterator<Item = &'s S>,
        F: FnMut(&K, &V, &V) -> V,
    {
        for source in sources {
            for (key, value) in source.to_pairs() {
                let transformed = self.transform.apply(&key);
                let resolved = match self.store.get(&transformed) {
                    Some(slot) => conflict(&transformed, &slot.value, &value),
                    None => value,
                };
                self.store.insert(transformed, key, resolved);
            }
        }
    }

    /// A new map with the same keys and each value replaced by
    /// `mapper(value)`. The default policy does not carry over, since
    /// the value type changes.
    #[must_use]
    pub fn transform_values<V2>(&self, mut mapper: impl FnMut(&V) -> V2) -> TransformMap<K, V2> {
        let mut mapped = TransformMap {
            store: self.store.fresh(),
            transform: self.transform.clone(),
            default: DefaultPolicy::None,
            style: self.style,
        };
        for (transformed, slot) in self.store.iter() {
            mapped.store.insert(
                transformed.clone(),
                slot.original.clone(),
                mapper(&slot.value),
            );
        }
        mapped
    }

    /// Replaces each value with `mapper(value)` in place.
    pub fn transform_values_mut(&mut self, mut mapper: impl FnMut(&mut V)) {
        for (_, slot) in self.store.iter_mut() {
            mapper(&mut slot.value);
        }
    }
}

impl<K: Clone + Hash + Eq, U: Clone> TransformMap<K, Option<U>> {
    /// A new map without the `None`-valued entries, unwrapping the rest.
    /// The default policy does not carry over, since the value type
    /// changes.
    #[must_use]
    pub fn compact(&self) -> TransformMap<K, U> {
        let mut compacted = TransformMap {
            store: self.store.fresh(),
            transform: self.transform.clone(),
            default: DefaultPolicy::None,
            style: self.style,
        };
        for (transformed, slot) in self.store.iter() {
            if let Some(value) = &slot.value {
                compacted.store.insert(
                    transformed.clone(),
                    slot.original.clone(),
                    value.clone(),
                );
            }
        }
        compacted
    }

    /// Removes the `None`-valued entries in place; returns whether any
    /// entry was removed.
    pub fn compact_mut(&mut self) -> bool {
        self.store.retain(|_, slot| slot.value.is_some()) > 0
    }
}

impl<K: Clone + Hash + Eq, V> TransformMap<K, TransformMap<K, V>> {
    /// Looks up a nested value: the outer key is transformed by this
    /// map, the inner key by the nested map's own transform.
    ///
    /// Deeper chains compose by calling `dig` or `get` on the result.
    #[must_use]
    pub fn dig(&self, outer: &K, inner: &K) -> Option<&V> {
        self.get(outer).and_then(|nested| nested.get(inner))
    }
}

// =============================================================================
// Comparison
// =============================================================================

impl<K: Clone + Hash + Eq, V: PartialEq> TransformMap<K, V> {
    /// Returns `true` if every transformed-key/value pair of this map
    /// exists identically in `other`. Order-independent.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len()
            && self.store.iter().all(|(transformed, slot)| {
                other
                    .store
                    .get(transformed)
                    .is_some_and(|theirs| theirs.value == slot.value)
            })
    }

    /// Subset with strictly fewer entries.
    #[must_use]
    pub fn is_proper_subset(&self, other: &Self) -> bool {
        self.is_subset(other) && self.len() != other.len()
    }

    /// Returns `true` if `other` is a subset of this map.
    #[must_use]
    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }

    /// Superset with strictly more entries.
    #[must_use]
    pub fn is_proper_superset(&self, other: &Self) -> bool {
        other.is_proper_subset(self)
    }
}

impl<K: Clone + Hash + Eq, V: PartialEq> PartialEq for TransformMap<K, V> {
    /// Order-independent structural equality over the transformed-key →
    /// value mapping. The transform function, key style, and default
    /// policy do not participate.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.is_subset(other)
    }
}

impl<K: Clone + Hash + Eq, V: Eq> Eq for TransformMap<K, V> {}

impl<K: Clone + Hash + Eq, V: PartialEq> PartialOrd for TransformMap<K, V> {
    /// The subset partial order: `a < b` when `a` is a proper subset of
    /// `b`. Maps with differing entries on both sides are unordered.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.len().cmp(&other.len()) {
            Ordering::Equal => self.is_subset(other).then_some(Ordering::Equal),
            Ordering::Less => self.is_subset(other).then_some(Ordering::Less),
            Ordering::Greater => other.is_subset(self).then_some(Ordering::Greater),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for TransformMap<K, V> {
    /// Renders like the underlying ordered-mapping primitive, using the
    /// exposed key representation in insertion order.
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// Iteration traits
// =============================================================================

/// Iterator over `(exposed key, value)` pairs in insertion order.
pub struct Iter<'a, K, V> {
    inner: StoreIter<'a, K, V>,
    style: KeyStyle,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(transformed, slot)| {
            let key = match self.style {
                KeyStyle::Transformed => transformed,
                KeyStyle::Retained => &slot.original,
            };
            (key, &slot.value)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over `(transformed key, original key, value)` triples in
/// insertion order.
pub struct Entries<'a, K, V> {
    inner: StoreIter<'a, K, V>,
}

impl<'a, K, V> Iterator for Entries<'a, K, V> {
    type Item = (&'a K, &'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(transformed, slot)| (transformed, &slot.original, &slot.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Entries<'_, K, V> {}

/// Iterator over exposed keys in insertion order.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// Iterator over values in insertion order.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// Owning iterator over `(exposed key, value)` pairs in insertion order.
pub struct IntoIter<K, V> {
    inner: StoreIntoIter<K, V>,
    style: KeyStyle,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(transformed, slot)| {
            let key = match self.style {
                KeyStyle::Transformed => transformed,
                KeyStyle::Retained => slot.original,
            };
            (key, slot.value)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> IntoIterator for TransformMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.store.into_entries(),
            style: self.style,
        }
    }
}

impl<'a, K, V> IntoIterator for &'a TransformMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Clone + Hash + Eq, V> FromIterator<(K, V)> for TransformMap<K, V> {
    /// Collects pairs into an identity-transform map.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Clone + Hash + Eq, V> Extend<(K, V)> for TransformMap<K, V> {
    /// Stores each pair through this map's transform function.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Clone + Hash + Eq, V: Clone> ToPairs<K, V> for TransformMap<K, V> {
    /// The exposed-key mapping as pairs, matching
    /// [`to_index_map`](TransformMap::to_index_map).
    fn to_pairs(&self) -> Vec<(K, V)> {
        self.iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V> serde::Serialize for TransformMap<K, V>
where
    K: serde::Serialize,
    V: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut state = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            state.serialize_entry(key, value)?;
        }
        state.end()
    }
}

#[cfg(feature = "serde")]
struct TransformMapVisitor<K, V> {
    marker: std::marker::PhantomData<(K, V)>,
}

#[cfg(feature = "serde")]
impl<K, V> TransformMapVisitor<K, V> {
    const fn new() -> Self {
        Self {
            marker: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::de::Visitor<'de> for TransformMapVisitor<K, V>
where
    K: serde::Deserialize<'de> + Clone + Hash + Eq,
    V: serde::Deserialize<'de>,
{
    type Value = TransformMap<K, V>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut map = TransformMap::new();
        while let Some((key, value)) = access.next_entry()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::Deserialize<'de> for TransformMap<K, V>
where
    K: serde::Deserialize<'de> + Clone + Hash + Eq,
    V: serde::Deserialize<'de>,
{
    /// Deserializes into an identity-transform map exposing transformed
    /// keys; transform functions are not serializable.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(TransformMapVisitor::new())
    }
}
