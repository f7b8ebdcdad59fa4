//! Reference-identity comparison for keys.

use std::rc::Rc;
use std::sync::Arc;

/// Types whose values can be told apart by identity rather than equality.
///
/// [`TransformMap::compare_by_identity`](crate::TransformMap::compare_by_identity)
/// switches the entry store from equality-based lookup to identity-based
/// lookup. Shared pointers compare by allocation, so two clones of the
/// same `Rc` are identical while two separately built values are not.
/// Small scalar types behave like interned values: equal scalars are the
/// same identity.
///
/// # Examples
///
/// ```rust
/// use std::rc::Rc;
/// use keymorph::Identical;
///
/// let first: Rc<str> = Rc::from("key");
/// let alias = Rc::clone(&first);
/// let second: Rc<str> = Rc::from("key");
///
/// assert!(first.identical_to(&alias));
/// assert!(!first.identical_to(&second));
/// ```
pub trait Identical {
    /// Returns `true` if `self` and `other` are the same identity.
    fn identical_to(&self, other: &Self) -> bool;
}

impl<T: ?Sized> Identical for Rc<T> {
    #[inline]
    fn identical_to(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> Identical for Arc<T> {
    #[inline]
    fn identical_to(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

macro_rules! identical_by_value {
    ($($type:ty),* $(,)?) => {
        $(
            impl Identical for $type {
                #[inline]
                fn identical_to(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

identical_by_value!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, bool, char);

/// Monomorphic form used as the stored comparator of an identity-mode
/// entry store.
pub(crate) fn identical<K: Identical>(left: &K, right: &K) -> bool {
    left.identical_to(right)
}
