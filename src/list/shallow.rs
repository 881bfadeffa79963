//! Shallow equality used by [`LockingList::contains`](super::LockingList::contains).
//!
//! Values compare by value; shared handles compare by the allocation they
//! point at, never by what is inside it. Structural comparison through
//! handles is what [`contains_deep`](super::LockingList::contains_deep) does.

use std::rc::Rc;
use std::sync::Arc;

/// Identity-style equality.
pub trait ShallowEq {
    /// Returns `true` if `self` and `other` are the same value or handle.
    fn shallow_eq(&self, other: &Self) -> bool;
}

macro_rules! impl_shallow_eq_by_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ShallowEq for $ty {
                #[inline]
                fn shallow_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

impl_shallow_eq_by_value!(
    bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, (),
    String, &str,
);

impl<T: ?Sized> ShallowEq for Arc<T> {
    #[inline]
    fn shallow_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> ShallowEq for Rc<T> {
    #[inline]
    fn shallow_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: ShallowEq> ShallowEq for Option<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.shallow_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}
