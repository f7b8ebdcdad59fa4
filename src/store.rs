//! The ordered entry store backing [`TransformMap`](crate::TransformMap).
//!
//! Storage is keyed by the transformed key and carries the original
//! (pre-transform) key alongside each value. The store has two states, in
//! the manner of a state-transitioning collection:
//!
//! - `Equality`: the normal state, backed by an insertion-ordered
//!   `IndexMap` with O(1) amortized point lookup.
//! - `Identity`: entered by `compare_by_identity`; entries move to a
//!   `Vec` scanned with a stored identity comparator, so equal-but-distinct
//!   keys occupy distinct slots. Lookups in this state are linear.
//!
//! Both states preserve first-insertion order of the transformed key, and
//! updates to an existing key never move its position.

use std::hash::Hash;
use std::mem;

use indexmap::IndexMap;
use indexmap::map as index_map;

/// One stored entry: the value plus the original (pre-transform) key.
///
/// The original key tracks the *most recent* store for its transformed
/// key, not the first.
#[derive(Clone)]
pub(crate) struct Slot<K, V> {
    pub(crate) original: K,
    pub(crate) value: V,
}

/// Insertion-ordered storage keyed by transformed key.
#[derive(Clone)]
pub(crate) enum EntryStore<K, V> {
    Equality(IndexMap<K, Slot<K, V>>),
    Identity {
        entries: Vec<(K, Slot<K, V>)>,
        same: fn(&K, &K) -> bool,
    },
}

impl<K, V> EntryStore<K, V> {
    pub(crate) fn new() -> Self {
        Self::Equality(IndexMap::new())
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Equality(map) => map.len(),
            Self::Identity { entries, .. } => entries.len(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn clear(&mut self) {
        match self {
            Self::Equality(map) => map.clear(),
            Self::Identity { entries, .. } => entries.clear(),
        }
    }

    pub(crate) fn compares_by_identity(&self) -> bool {
        matches!(self, Self::Identity { .. })
    }

    /// An empty store in the same comparison mode, possibly for a
    /// different value type.
    pub(crate) fn fresh<V2>(&self) -> EntryStore<K, V2> {
        match self {
            Self::Equality(_) => EntryStore::Equality(IndexMap::new()),
            Self::Identity { same, .. } => EntryStore::Identity {
                entries: Vec::new(),
                same: *same,
            },
        }
    }

    pub(crate) fn iter(&self) -> StoreIter<'_, K, V> {
        match self {
            Self::Equality(map) => StoreIter::Equality(map.iter()),
            Self::Identity { entries, .. } => StoreIter::Identity(entries.iter()),
        }
    }

    pub(crate) fn iter_mut(&mut self) -> StoreIterMut<'_, K, V> {
        match self {
            Self::Equality(map) => StoreIterMut::Equality(map.iter_mut()),
            Self::Identity { entries, .. } => StoreIterMut::Identity(entries.iter_mut()),
        }
    }

    pub(crate) fn into_entries(self) -> StoreIntoIter<K, V> {
        match self {
            Self::Equality(map) => StoreIntoIter::Equality(map.into_iter()),
            Self::Identity { entries, .. } => StoreIntoIter::Identity(entries.into_iter()),
        }
    }
}

impl<K: Hash + Eq, V> EntryStore<K, V> {
    pub(crate) fn get(&self, key: &K) -> Option<&Slot<K, V>> {
        match self {
            Self::Equality(map) => map.get(key),
            Self::Identity { entries, same } => entries
                .iter()
                .find(|(stored, _)| same(stored, key))
                .map(|(_, slot)| slot),
        }
    }

    pub(crate) fn get_mut(&mut self, key: &K) -> Option<&mut Slot<K, V>> {
        match self {
            Self::Equality(map) => map.get_mut(key),
            Self::Identity { entries, same } => {
                let same = *same;
                entries
                    .iter_mut()
                    .find(|(stored, _)| same(stored, key))
                    .map(|(_, slot)| slot)
            }
        }
    }

    /// Inserts or updates, returning the displaced value. Updates keep
    /// the entry's position and overwrite its original key.
    pub(crate) fn insert(&mut self, key: K, original: K, value: V) -> Option<V> {
        match self {
            Self::Equality(map) => match map.entry(key) {
                index_map::Entry::Occupied(mut occupied) => {
                    let slot = occupied.get_mut();
                    slot.original = original;
                    Some(mem::replace(&mut slot.value, value))
                }
                index_map::Entry::Vacant(vacant) => {
                    vacant.insert(Slot { original, value });
                    None
                }
            },
            Self::Identity { entries, same } => {
                let same = *same;
                if let Some((_, slot)) = entries.iter_mut().find(|(stored, _)| same(stored, &key)) {
                    slot.original = original;
                    Some(mem::replace(&mut slot.value, value))
                } else {
                    entries.push((key, Slot { original, value }));
                    None
                }
            }
        }
    }

    /// Removes an entry, closing the gap so insertion order of the
    /// remaining entries is preserved.
    pub(crate) fn remove(&mut self, key: &K) -> Option<Slot<K, V>> {
        match self {
            Self::Equality(map) => map.shift_remove(key),
            Self::Identity { entries, same } => {
                let same = *same;
                let position = entries.iter().position(|(stored, _)| same(stored, key))?;
                Some(entries.remove(position).1)
            }
        }
    }

    /// Keeps entries satisfying the predicate; returns how many were
    /// removed.
    pub(crate) fn retain(&mut self, mut predicate: impl FnMut(&K, &Slot<K, V>) -> bool) -> usize {
        let before = self.len();
        match self {
            Self::Equality(map) => map.retain(|key, slot| predicate(key, slot)),
            Self::Identity { entries, .. } => {
                entries.retain(|(key, slot)| predicate(key, slot));
            }
        }
        before - self.len()
    }

    /// Converts to the identity state, keeping entry order. A no-op if
    /// already in that state.
    pub(crate) fn switch_to_identity(&mut self, same: fn(&K, &K) -> bool) {
        if let Self::Equality(map) = self {
            let entries = mem::take(map).into_iter().collect();
            *self = Self::Identity { entries, same };
        }
    }
}

// =============================================================================
// Store iterators
// =============================================================================

pub(crate) enum StoreIter<'a, K, V> {
    Equality(index_map::Iter<'a, K, Slot<K, V>>),
    Identity(std::slice::Iter<'a, (K, Slot<K, V>)>),
}

impl<'a, K, V> Iterator for StoreIter<'a, K, V> {
    type Item = (&'a K, &'a Slot<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Equality(iter) => iter.next(),
            Self::Identity(iter) => iter.next().map(|(key, slot)| (key, slot)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Self::Equality(iter) => iter.size_hint(),
            Self::Identity(iter) => iter.size_hint(),
        }
    }
}

impl<K, V> ExactSizeIterator for StoreIter<'_, K, V> {}

pub(crate) enum StoreIterMut<'a, K, V> {
    Equality(index_map::IterMut<'a, K, Slot<K, V>>),
    Identity(std::slice::IterMut<'a, (K, Slot<K, V>)>),
}

impl<'a, K, V> Iterator for StoreIterMut<'a, K, V> {
    type Item = (&'a K, &'a mut Slot<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Equality(iter) => iter.next(),
            Self::Identity(iter) => iter.next().map(|(key, slot)| (&*key, slot)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Self::Equality(iter) => iter.size_hint(),
            Self::Identity(iter) => iter.size_hint(),
        }
    }
}

impl<K, V> ExactSizeIterator for StoreIterMut<'_, K, V> {}

pub(crate) enum StoreIntoIter<K, V> {
    Equality(index_map::IntoIter<K, Slot<K, V>>),
    Identity(std::vec::IntoIter<(K, Slot<K, V>)>),
}

impl<K, V> Iterator for StoreIntoIter<K, V> {
    type Item = (K, Slot<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Equality(iter) => iter.next(),
            Self::Identity(iter) => iter.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Self::Equality(iter) => iter.size_hint(),
            Self::Identity(iter) => iter.size_hint(),
        }
    }
}

impl<K, V> ExactSizeIterator for StoreIntoIter<K, V> {}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::identical;
    use std::rc::Rc;

    fn store_of(pairs: &[(&str, i32)]) -> EntryStore<String, i32> {
        let mut store = EntryStore::new();
        for (key, value) in pairs {
            store.insert((*key).to_string(), (*key).to_string(), *value);
        }
        store
    }

    #[test]
    fn insert_keeps_first_insertion_position_on_update() {
        let mut store = store_of(&[("a", 1), ("b", 2), ("c", 3)]);
        let displaced = store.insert("a".to_string(), "a".to_string(), 10);
        assert_eq!(displaced, Some(1));

        let keys: Vec<&str> = store.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn remove_preserves_order_of_remaining_entries() {
        let mut store = store_of(&[("a", 1), ("b", 2), ("c", 3)]);
        let removed = store.remove(&"b".to_string());
        assert_eq!(removed.map(|slot| slot.value), Some(2));

        let keys: Vec<&str> = store.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, ["a", "c"]);
    }

    #[test]
    fn insert_overwrites_original_key() {
        let mut store: EntryStore<String, i32> = EntryStore::new();
        store.insert("foo".to_string(), "Foo".to_string(), 1);
        store.insert("foo".to_string(), "FOO".to_string(), 2);

        let slot = store.get(&"foo".to_string()).unwrap();
        assert_eq!(slot.original, "FOO");
        assert_eq!(slot.value, 2);
    }

    #[test]
    fn switch_to_identity_keeps_order_and_separates_equal_keys() {
        let first: Rc<str> = Rc::from("key");
        let second: Rc<str> = Rc::from("key");

        let mut store: EntryStore<Rc<str>, i32> = EntryStore::new();
        store.insert(Rc::clone(&first), Rc::clone(&first), 1);
        assert_eq!(store.len(), 1);

        store.switch_to_identity(identical::<Rc<str>>);
        assert!(store.compares_by_identity());

        store.insert(Rc::clone(&second), Rc::clone(&second), 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&first).map(|slot| slot.value), Some(1));
        assert_eq!(store.get(&second).map(|slot| slot.value), Some(2));
    }

    #[test]
    fn retain_reports_removed_count() {
        let mut store = store_of(&[("a", 1), ("b", 2), ("c", 3)]);
        assert_eq!(store.retain(|_, slot| slot.value != 2), 1);
        assert_eq!(store.retain(|_, _| true), 0);
        assert_eq!(store.len(), 2);
    }
}
