//! Handles compare by the address of their pointee, not by lineage, so a
//! handle equals a `Box`, a raw pointer or another handle to the same object.
//!
//! Zero-sized pointees share one dangling address and therefore compare equal.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr::{self, NonNull};

use crate::pointer::OwnedPtr;

impl<T: ?Sized> OwnedPtr<T> {
    /// Thin address of the pointee, null for a null handle. Never fails,
    /// even after the pointee is gone.
    #[inline]
    pub fn addr(&self) -> *const () {
        match &self.inner {
            Some(lineage) => lineage.ptr.as_ptr() as *const (),
            None => ptr::null(),
        }
    }
}

impl<T: ?Sized, U: ?Sized> PartialEq<OwnedPtr<U>> for OwnedPtr<T> {
    #[inline]
    fn eq(&self, other: &OwnedPtr<U>) -> bool {
        self.addr() == other.addr()
    }
}

impl<T: ?Sized> Eq for OwnedPtr<T> {}

impl<T: ?Sized, U: ?Sized> PartialOrd<OwnedPtr<U>> for OwnedPtr<T> {
    #[inline]
    fn partial_cmp(&self, other: &OwnedPtr<U>) -> Option<Ordering> {
        Some(self.addr().cmp(&other.addr()))
    }
}

/// Orders by pointee address. Handles to distinct zero-sized pointees share
/// one address, so an ordered set keeps only one of them.
impl<T: ?Sized> Ord for OwnedPtr<T> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.addr().cmp(&other.addr())
    }
}

/// Hashes the pointee address, consistent with `Eq`. Distinct zero-sized
/// pointees hash and compare equal, so a `HashSet` keeps only one of them.
impl<T: ?Sized> Hash for OwnedPtr<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state)
    }
}

impl<T: ?Sized, U: ?Sized> PartialEq<Box<U>> for OwnedPtr<T> {
    #[inline]
    fn eq(&self, other: &Box<U>) -> bool {
        self.addr() == &**other as *const U as *const ()
    }
}

impl<T: ?Sized, U: ?Sized> PartialEq<Option<Box<U>>> for OwnedPtr<T> {
    #[inline]
    fn eq(&self, other: &Option<Box<U>>) -> bool {
        match other {
            Some(boxed) => self == boxed,
            None => self.is_null(),
        }
    }
}

impl<T: ?Sized, U: ?Sized> PartialEq<*const U> for OwnedPtr<T> {
    #[inline]
    fn eq(&self, other: &*const U) -> bool {
        self.addr() == *other as *const ()
    }
}

impl<T: ?Sized, U: ?Sized> PartialEq<*mut U> for OwnedPtr<T> {
    #[inline]
    fn eq(&self, other: &*mut U) -> bool {
        self.addr() == *other as *const ()
    }
}

impl<T: ?Sized, U: ?Sized> PartialEq<NonNull<U>> for OwnedPtr<T> {
    #[inline]
    fn eq(&self, other: &NonNull<U>) -> bool {
        self.addr() == other.as_ptr() as *const ()
    }
}

impl<T: ?Sized, U: ?Sized> PartialEq<OwnedPtr<U>> for *const T {
    #[inline]
    fn eq(&self, other: &OwnedPtr<U>) -> bool {
        other == self
    }
}

impl<T: ?Sized, U: ?Sized> PartialEq<OwnedPtr<U>> for NonNull<T> {
    #[inline]
    fn eq(&self, other: &OwnedPtr<U>) -> bool {
        other == self
    }
}

impl<T: ?Sized> fmt::Debug for OwnedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedPtr")
            .field("addr", &self.addr())
            .field("acquired", &self.is_acquired())
            .field("expired", &self.is_expired())
            .field("handles", &self.handle_count())
            .finish()
    }
}

impl<T: ?Sized> fmt::Pointer for OwnedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.addr(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::make_owned;
    use std::collections::{BTreeSet, HashSet};

    #[test]
    fn test_null_handles_compare_equal() {
        let a = OwnedPtr::<u32>::null();
        let b = OwnedPtr::<String>::default();

        assert_eq!(a, b);
        assert!(a == ptr::null::<u8>());
        assert!(a == None::<Box<u32>>);
        assert_eq!(format!("{:p}", a), format!("{:p}", ptr::null::<()>()));
    }

    #[test]
    fn test_ordering_follows_addresses() {
        let p = make_owned(1u64);
        let r = make_owned(2u64);

        assert_eq!(p.partial_cmp(&r), Some(p.addr().cmp(&r.addr())));
        assert_eq!(p < r, p.addr() < r.addr());
        assert_eq!(p >= r, p.addr() >= r.addr());
        assert_eq!(p.cmp(&p.clone()), Ordering::Equal);
    }

    #[test]
    fn test_usable_as_set_key() {
        let p = make_owned(1u8);
        let r = make_owned(2u8);

        let hashed: HashSet<_> = vec![p.clone(), r.clone(), p.clone()].into_iter().collect();
        let ordered: BTreeSet<_> = vec![r.clone(), p.clone(), r.clone()].into_iter().collect();

        assert_eq!(hashed.len(), 2);
        assert_eq!(ordered.len(), 2);
        assert!(hashed.contains(&p));
        assert!(ordered.contains(&r));
    }

    #[test]
    fn test_zero_sized_pointees_collapse_in_sets() {
        let a = make_owned(());
        let b = make_owned(());

        assert!(!a.same_lineage(&b));
        assert_eq!(a, b);

        let hashed: HashSet<_> = vec![a.clone(), b.clone()].into_iter().collect();
        let ordered: BTreeSet<_> = vec![a, b].into_iter().collect();

        assert_eq!(hashed.len(), 1);
        assert_eq!(ordered.len(), 1);
    }

    #[test]
    fn test_raw_pointer_comparisons() {
        let p = make_owned(5i32);
        let raw = p.as_ptr().unwrap();

        assert!(p == raw);
        assert!(raw == p);
        assert!(p == raw.as_ptr());
        assert!(raw.as_ptr() as *const i32 == p);
        assert!(p != ptr::null::<i32>());
    }
}
