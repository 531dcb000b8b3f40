//! Conversions between handle types sharing one lineage.

use std::any::Any;
use std::ptr::NonNull;

use crate::pointer::{Lineage, OwnedPtr};

impl<T: ?Sized> OwnedPtr<T> {
    /// Reinterprets the handle as a handle to `U`, keeping the lineage.
    ///
    /// Prefer [`owned_cast!`](crate::owned_cast), which only admits the
    /// unsizing coercions the compiler can prove (concrete type to `dyn Trait`,
    /// trait upcasts, arrays to slices).
    ///
    /// # Safety
    ///
    /// `f` must return a pointer to the very same object, with metadata valid
    /// for it, such that a `Box<U>` built from it frees the allocation
    /// correctly.
    pub unsafe fn cast_unchecked<U: ?Sized, F>(self, f: F) -> OwnedPtr<U>
    where
        F: FnOnce(NonNull<T>) -> NonNull<U>,
    {
        OwnedPtr {
            inner: self.inner.map(|Lineage { ptr, block }| Lineage {
                ptr: f(ptr),
                block,
            }),
        }
    }
}

macro_rules! impl_downcast {
    ($($bounds:tt)*) => {
        impl OwnedPtr<dyn Any $($bounds)*> {
            /// Handle to the concrete type `U` in the same lineage, or a null
            /// handle when the pointee is not a `U`.
            ///
            /// The pointee is inspected through a short [`borrow`](OwnedPtr::borrow),
            /// so a lineage that already handed it to a `Box` also yields null.
            pub fn downcast<U: Any>(&self) -> OwnedPtr<U> {
                let lineage = match &self.inner {
                    Some(lineage) => lineage,
                    None => return OwnedPtr::null(),
                };

                let matches = match self.borrow() {
                    Ok(pointee) => pointee.is::<U>(),
                    Err(_) => false,
                };

                if !matches {
                    return OwnedPtr::null();
                }

                OwnedPtr {
                    inner: Some(Lineage {
                        ptr: lineage.ptr.cast::<U>(),
                        block: lineage.block.clone(),
                    }),
                }
            }
        }
    };
}

impl_downcast!();
impl_downcast!(+ Send);
impl_downcast!(+ Send + Sync);

/// Converts a handle along an unsizing coercion, keeping its lineage.
///
/// ```rust
/// use std::fmt::Debug;
/// use owned_pointer::{make_owned, owned_cast, OwnedPtr};
///
/// let number = make_owned(42u32);
/// let shown: OwnedPtr<dyn Debug> = owned_cast!(number.clone() => dyn Debug);
///
/// assert_eq!(shown, number);
/// assert!(shown.same_lineage(&number));
/// ```
///
/// Unrelated targets do not compile:
///
/// ```compile_fail
/// use owned_pointer::{make_owned, owned_cast};
///
/// let number = make_owned(42u32);
/// let text = owned_cast!(number => String);
/// ```
#[macro_export]
macro_rules! owned_cast {
    ($ptr:expr => $target:ty) => {
        match $ptr {
            ptr => {
                // SAFETY: the closure is an implicit coercion, which only
                // admits unsizing of the same object.
                unsafe {
                    $crate::OwnedPtr::cast_unchecked(ptr, |p| {
                        let p: ::core::ptr::NonNull<$target> = p;
                        p
                    })
                }
            }
        }
    };
}
