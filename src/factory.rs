use crate::notify::{Notified, Tracked};
use crate::pointer::OwnedPtr;

/// Allocates `value` and returns the first handle of its lineage.
///
/// ```rust
/// let p = owned_pointer::make_owned(12);
/// let u = p.acquire().unwrap().unwrap();
///
/// assert!(p == u);
/// assert!(p.is_acquired());
/// ```
pub fn make_owned<T: 'static>(value: T) -> OwnedPtr<T> {
    OwnedPtr::from_box(Box::new(value))
}

/// Like [`make_owned`], for types that report their destruction through a
/// [`DropNotifier`](crate::DropNotifier).
pub fn make_tracked<T: Tracked + 'static>(value: T) -> OwnedPtr<T> {
    OwnedPtr::from_tracked(Box::new(value))
}

/// Wraps `value` into [`Notified`] so destruction by a `Box` is observable
/// for any type.
pub fn make_notified<T: 'static>(value: T) -> OwnedPtr<Notified<T>> {
    make_tracked(Notified::new(value))
}

/// Shorthand for [`OwnedPtr::link`].
#[allow(clippy::borrowed_box)]
pub fn link<T: ?Sized>(boxed: &Box<T>) -> OwnedPtr<T> {
    OwnedPtr::link(boxed)
}

/// Shorthand for [`OwnedPtr::link_tracked`].
#[allow(clippy::borrowed_box)]
pub fn link_tracked<T: ?Sized + Tracked>(boxed: &Box<T>) -> OwnedPtr<T> {
    OwnedPtr::link_tracked(boxed)
}
