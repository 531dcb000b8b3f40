use std::fmt;
use std::ops::Deref;
use std::ptr::NonNull;

use crate::control::ControlBlock;

/// Scoped shared borrow of a pointee, returned by [`OwnedPtr::borrow`](crate::OwnedPtr::borrow).
///
/// While any `Ref` of a lineage is alive no handle of it can acquire the
/// pointee, so the reference cannot outlive the object.
pub struct Ref<'a, T: ?Sized> {
    block: &'a ControlBlock,
    ptr: NonNull<T>,
}

impl<'a, T: ?Sized> Ref<'a, T> {
    /// `block` must already be pinned on behalf of the new guard.
    pub(crate) fn new(block: &'a ControlBlock, ptr: NonNull<T>) -> Self {
        Self { block, ptr }
    }

    /// Takes one more borrow of the same pointee.
    pub fn clone(orig: &Ref<'a, T>) -> Ref<'a, T> {
        orig.block.repin();
        Ref::new(orig.block, orig.ptr)
    }
}

impl<T: ?Sized> Deref for Ref<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the pin keeps the lineage from giving the pointee away and
        // the borrowed handle keeps the lineage, and so the pointee, alive.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T: ?Sized> Drop for Ref<'_, T> {
    fn drop(&mut self) {
        self.block.unpin();
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Ref<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: ?Sized + fmt::Display> fmt::Display for Ref<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}
