//! The key-normalization function owned by a container.

use std::fmt;
use std::rc::Rc;

/// The key-normalization strategy of a [`TransformMap`](crate::TransformMap).
///
/// Resolved once at construction into a concrete value, so lookups do not
/// branch on an `Option` at every call site: either the identity function
/// or a shared caller-supplied function. Derived maps share the same
/// allocation rather than copying it.
///
/// The container treats the function as pure: the same input must map to
/// the same output for the lifetime of the map, since every equality
/// guarantee of the container is stated over transformed keys.
///
/// # Examples
///
/// ```rust
/// use keymorph::Transform;
///
/// let lowercase: Transform<String> = Transform::new(|key: &String| key.to_lowercase());
/// assert_eq!(lowercase.apply(&"Foo".to_string()), "foo");
///
/// let identity: Transform<String> = Transform::identity();
/// assert_eq!(identity.apply(&"Foo".to_string()), "Foo");
/// ```
pub struct Transform<K> {
    inner: Inner<K>,
}

enum Inner<K> {
    Identity,
    Shared(Rc<dyn Fn(&K) -> K>),
}

impl<K> Transform<K> {
    /// The identity transform: keys are stored exactly as given.
    #[inline]
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            inner: Inner::Identity,
        }
    }

    /// Wraps a caller-supplied transform function.
    #[must_use]
    pub fn new(function: impl Fn(&K) -> K + 'static) -> Self {
        Self {
            inner: Inner::Shared(Rc::new(function)),
        }
    }

    /// Returns `true` if this is the identity transform.
    #[inline]
    #[must_use]
    pub const fn is_identity(&self) -> bool {
        matches!(self.inner, Inner::Identity)
    }

    /// Returns `true` if both transforms are the same function value:
    /// both identity, or both the same shared allocation.
    ///
    /// Container equality never consults this; it exists so callers can
    /// observe that derived maps share their source's transform.
    #[must_use]
    pub fn same_function(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (Inner::Identity, Inner::Identity) => true,
            (Inner::Shared(left), Inner::Shared(right)) => Rc::ptr_eq(left, right),
            _ => false,
        }
    }
}

impl<K: Clone> Transform<K> {
    /// Applies the transform to a key, producing the storage key.
    #[inline]
    pub fn apply(&self, key: &K) -> K {
        match &self.inner {
            Inner::Identity => key.clone(),
            Inner::Shared(function) => function(key),
        }
    }
}

impl<K> Clone for Transform<K> {
    fn clone(&self) -> Self {
        let inner = match &self.inner {
            Inner::Identity => Inner::Identity,
            Inner::Shared(function) => Inner::Shared(Rc::clone(function)),
        };
        Self { inner }
    }
}

impl<K> fmt::Debug for Transform<K> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner {
            Inner::Identity => formatter.write_str("Transform::Identity"),
            Inner::Shared(_) => formatter.write_str("Transform::Shared(..)"),
        }
    }
}
