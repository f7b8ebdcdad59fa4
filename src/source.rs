//! The "convertible to an ordered mapping" capability.

use indexmap::IndexMap;

/// A source of ordered key/value pairs.
///
/// Bulk construction ([`TransformMap::from_source`]) and merging
/// ([`TransformMap::merge`]) accept any source implementing this
/// capability, so plain mappings, pair slices, and other maps all feed
/// the same code path. The receiving map re-keys every produced pair
/// through its own transform function.
///
/// For a [`TransformMap`] the produced pairs use the *exposed* key
/// representation (the transformed key, or the retained original key),
/// matching its plain-mapping conversion.
///
/// [`TransformMap`]: crate::TransformMap
/// [`TransformMap::from_source`]: crate::TransformMap::from_source
/// [`TransformMap::merge`]: crate::TransformMap::merge
pub trait ToPairs<K, V> {
    /// Materializes the source as key/value pairs in its own order.
    fn to_pairs(&self) -> Vec<(K, V)>;
}

impl<K: Clone, V: Clone, S> ToPairs<K, V> for IndexMap<K, V, S> {
    fn to_pairs(&self) -> Vec<(K, V)> {
        self.iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl<K: Clone, V: Clone> ToPairs<K, V> for [(K, V)] {
    fn to_pairs(&self) -> Vec<(K, V)> {
        self.to_vec()
    }
}

impl<K: Clone, V: Clone, const N: usize> ToPairs<K, V> for [(K, V); N] {
    fn to_pairs(&self) -> Vec<(K, V)> {
        self.as_slice().to_vec()
    }
}

impl<K: Clone, V: Clone> ToPairs<K, V> for Vec<(K, V)> {
    fn to_pairs(&self) -> Vec<(K, V)> {
        self.clone()
    }
}
