#![forbid(unsafe_code)]

//! Leaf value identity and one-level structural equality.
//!
//! Change detection for memoized state selection is built from two
//! relations: [`SameValue`] decides whether a single slot changed, and
//! [`ShallowEq`] compares exactly one level of structure using `SameValue`
//! on the parts.
//!
//! # Design
//!
//! `SameValue` differs from `PartialEq` only where `PartialEq` is the wrong
//! tool for "did this slot change":
//!
//! - Every NaN is same-value as every other NaN. A selector that produced
//!   NaN twice did not change.
//! - `0.0` and `-0.0` are *not* same-value. They are distinct states that
//!   produce different results downstream (`1.0 / x` diverges).
//! - `Rc`/`Arc` compare by pointer identity, never by contents. A rebuilt
//!   allocation with equal contents counts as a change.
//!
//! `ShallowEq` never recurses. Container impls compare length/key sets and
//! then apply `SameValue` to each part, so nested containers fall back to
//! pointer identity (via `Rc`/`Arc`) or leaf equality.
//!
//! # Invariants
//!
//! 1. Both relations are reflexive (including NaN) and symmetric.
//! 2. `same_value(&0.0, &-0.0)` is `false` for `f32` and `f64`.
//! 3. Map comparison is exact on key sets: a key present on one side only
//!    fails the comparison even when its value is `None`.
//!
//! # Example
//!
//! ```
//! use frankenstore_core::equality::{same_value, shallow_equal};
//! use std::collections::HashMap;
//!
//! assert!(same_value(&f64::NAN, &f64::NAN));
//! assert!(!same_value(&0.0_f64, &-0.0_f64));
//!
//! let a = HashMap::from([("count", 1_i32), ("page", 4)]);
//! let b = HashMap::from([("count", 1_i32), ("page", 4)]);
//! assert!(shallow_equal(&a, &b));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;
use std::sync::Arc;

/// Identity comparison for a single state slot.
///
/// See the module docs for where this deliberately diverges from
/// `PartialEq`. Everywhere else it should agree with `==`.
pub trait SameValue {
    fn same_value(&self, other: &Self) -> bool;
}

/// Free-function form of [`SameValue::same_value`].
#[must_use]
pub fn same_value<T: SameValue + ?Sized>(a: &T, b: &T) -> bool {
    a.same_value(b)
}

/// One-level structural comparison.
///
/// Containers compare their shape, then each part by [`SameValue`]. Leaf
/// types delegate straight to `SameValue` so a bare value can stand in for
/// a one-field container.
pub trait ShallowEq {
    fn shallow_eq(&self, other: &Self) -> bool;
}

/// Free-function form of [`ShallowEq::shallow_eq`].
#[must_use]
pub fn shallow_equal<T: ShallowEq + ?Sized>(a: &T, b: &T) -> bool {
    a.shallow_eq(b)
}

// ---------------------------------------------------------------------------
// SameValue impls
// ---------------------------------------------------------------------------

macro_rules! same_value_via_eq {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SameValue for $ty {
                #[inline]
                fn same_value(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

same_value_via_eq!(
    (), bool, char,
    u8, u16, u32, u64, u128, usize,
    i8, i16, i32, i64, i128, isize,
    str, String,
);

// Floats use bitwise identity plus a NaN class: NaN == NaN, 0.0 != -0.0.
macro_rules! same_value_float {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SameValue for $ty {
                #[inline]
                fn same_value(&self, other: &Self) -> bool {
                    self.to_bits() == other.to_bits()
                        || (self.is_nan() && other.is_nan())
                }
            }
        )*
    };
}

same_value_float!(f32, f64);

impl<T: SameValue + ?Sized> SameValue for &T {
    #[inline]
    fn same_value(&self, other: &Self) -> bool {
        (**self).same_value(*other)
    }
}

// Shared pointers are identity, not contents.
impl<T: ?Sized> SameValue for Rc<T> {
    #[inline]
    fn same_value(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> SameValue for Arc<T> {
    #[inline]
    fn same_value(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: SameValue> SameValue for Option<T> {
    fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => a.same_value(b),
            _ => false,
        }
    }
}

impl<A: SameValue, B: SameValue> SameValue for (A, B) {
    fn same_value(&self, other: &Self) -> bool {
        self.0.same_value(&other.0) && self.1.same_value(&other.1)
    }
}

impl<A: SameValue, B: SameValue, C: SameValue> SameValue for (A, B, C) {
    fn same_value(&self, other: &Self) -> bool {
        self.0.same_value(&other.0)
            && self.1.same_value(&other.1)
            && self.2.same_value(&other.2)
    }
}

impl<A: SameValue, B: SameValue, C: SameValue, D: SameValue> SameValue for (A, B, C, D) {
    fn same_value(&self, other: &Self) -> bool {
        self.0.same_value(&other.0)
            && self.1.same_value(&other.1)
            && self.2.same_value(&other.2)
            && self.3.same_value(&other.3)
    }
}

// ---------------------------------------------------------------------------
// ShallowEq impls
// ---------------------------------------------------------------------------

// Leaf types: one level of a bare value is the value itself.
macro_rules! shallow_eq_via_same_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ShallowEq for $ty {
                #[inline]
                fn shallow_eq(&self, other: &Self) -> bool {
                    self.same_value(other)
                }
            }
        )*
    };
}

shallow_eq_via_same_value!(
    (), bool, char,
    u8, u16, u32, u64, u128, usize,
    i8, i16, i32, i64, i128, isize,
    f32, f64,
    str, String,
);

impl<T: ShallowEq + ?Sized> ShallowEq for &T {
    #[inline]
    fn shallow_eq(&self, other: &Self) -> bool {
        (**self).shallow_eq(*other)
    }
}

impl<T: ?Sized> ShallowEq for Rc<T> {
    #[inline]
    fn shallow_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> ShallowEq for Arc<T> {
    #[inline]
    fn shallow_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: SameValue> ShallowEq for Option<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.same_value(other)
    }
}

impl<K, V, S> ShallowEq for HashMap<K, V, S>
where
    K: Eq + Hash,
    V: SameValue,
    S: BuildHasher,
{
    fn shallow_eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter()
            .all(|(key, value)| other.get(key).is_some_and(|w| value.same_value(w)))
    }
}

impl<K: Ord, V: SameValue> ShallowEq for BTreeMap<K, V> {
    fn shallow_eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter()
            .all(|(key, value)| other.get(key).is_some_and(|w| value.same_value(w)))
    }
}

impl<T: SameValue> ShallowEq for [T] {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().zip(other).all(|(a, b)| a.same_value(b))
    }
}

impl<T: SameValue> ShallowEq for Vec<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.as_slice().shallow_eq(other.as_slice())
    }
}

impl<A: SameValue, B: SameValue> ShallowEq for (A, B) {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.same_value(other)
    }
}

impl<A: SameValue, B: SameValue, C: SameValue> ShallowEq for (A, B, C) {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.same_value(other)
    }
}

impl<A: SameValue, B: SameValue, C: SameValue, D: SameValue> ShallowEq for (A, B, C, D) {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.same_value(other)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
