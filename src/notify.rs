//! Destruction notification for pointees that may be dropped by a `Box`.
//!
//! A lineage loses sight of its pointee once it has been acquired. Types that
//! embed a [`DropNotifier`] and expose it through [`Tracked`] tell the lineage
//! when the owning `Box` finally drops them, so every remaining handle turns
//! [`expired`](crate::OwnedPtr::is_expired).
//!
//! ```rust
//! use owned_pointer::{make_tracked, DropNotifier, Tracked};
//!
//! #[derive(Default)]
//! struct Connection {
//!     notifier: DropNotifier,
//! }
//!
//! impl Tracked for Connection {
//!     fn drop_notifier(&self) -> &DropNotifier {
//!         &self.notifier
//!     }
//! }
//!
//! let conn = make_tracked(Connection::default());
//! let owner = conn.acquire().unwrap();
//!
//! drop(owner);
//! assert!(conn.is_expired());
//! ```

use std::alloc::Layout;
use std::any::TypeId;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::control::ControlBlock;

/// Capability of a pointee to report its own destruction.
///
/// Implement it for a type (or require it as a supertrait of a trait you hand
/// out as `dyn Trait`) and construct handles with
/// [`make_tracked`](crate::make_tracked), [`OwnedPtr::from_tracked`](crate::OwnedPtr::from_tracked)
/// or [`OwnedPtr::link_tracked`](crate::OwnedPtr::link_tracked).
pub trait Tracked: 'static {
    fn drop_notifier(&self) -> &DropNotifier;

    /// Concrete type behind `self`, also when reached through `dyn Trait`.
    /// Cannot be overridden outside this crate.
    #[doc(hidden)]
    fn concrete_type_id(&self, _: sealed::Token) -> TypeId {
        TypeId::of::<Self>()
    }
}

mod sealed {
    pub struct Token;
}

/// What a lineage knows about the object it adopted. A `Box` handed back to
/// a lineage must match it before the lineage takes the object over again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Identity {
    type_id: TypeId,
    layout: Layout,
}

impl Identity {
    pub(crate) fn of<T: ?Sized + Tracked>(value: &T) -> Self {
        Self {
            type_id: value.concrete_type_id(sealed::Token),
            layout: Layout::for_value(value),
        }
    }
}

/// Weak back-link from a pointee to the lineage managing it.
///
/// Cloning yields a detached notifier: a copy of a value is a different object.
#[derive(Default)]
pub struct DropNotifier {
    link: Mutex<Weak<ControlBlock>>,
}

impl DropNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a live lineage is currently linked to this notifier.
    pub fn is_attached(&self) -> bool {
        self.link.lock().strong_count() > 0
    }

    pub(crate) fn lineage(&self) -> Option<Arc<ControlBlock>> {
        self.link.lock().upgrade()
    }

    pub(crate) fn attach(&self, block: &Arc<ControlBlock>) {
        *self.link.lock() = Arc::downgrade(block);
    }
}

impl Clone for DropNotifier {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl fmt::Debug for DropNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropNotifier")
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl Drop for DropNotifier {
    fn drop(&mut self) {
        if let Some(block) = self.link.get_mut().upgrade() {
            block.mark_destroyed();
        }
    }
}

/// Pairs any value with a [`DropNotifier`], for types that cannot embed one.
///
/// [`make_notified`](crate::make_notified) builds handles of this type.
#[derive(Debug, Default, Clone)]
pub struct Notified<T> {
    value: T,
    notifier: DropNotifier,
}

impl<T> Notified<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            notifier: DropNotifier::new(),
        }
    }

    /// Unwraps the value. The linked lineage, if any, sees the object destroyed.
    pub fn into_inner(self) -> T {
        let Notified { value, notifier } = self;
        drop(notifier);
        value
    }
}

impl<T: 'static> Tracked for Notified<T> {
    fn drop_notifier(&self) -> &DropNotifier {
        &self.notifier
    }
}

impl<T> Deref for Notified<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Notified<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Option<Identity> {
        Some(Identity::of(&Notified::new(())))
    }

    #[test]
    fn test_identity_sees_through_trait_objects() {
        let value = Notified::new(1u32);
        let erased: &dyn Tracked = &value;

        assert_eq!(Identity::of(erased), Identity::of(&value));
        assert_ne!(Identity::of(erased), Identity::of(&Notified::new(1u64)));
        assert_ne!(Identity::of(erased), Identity::of(&Notified::new(1i32)));
    }

    #[test]
    fn test_detached_notifier_is_silent() {
        let notifier = DropNotifier::new();
        assert!(!notifier.is_attached());
        drop(notifier);
    }

    #[test]
    fn test_drop_marks_lineage_destroyed() {
        let block = ControlBlock::observing(std::ptr::null(), identity());
        let notifier = DropNotifier::new();

        notifier.attach(&block);
        assert!(notifier.is_attached());
        assert!(!block.is_destroyed());

        drop(notifier);
        assert!(block.is_destroyed());
    }

    #[test]
    fn test_clone_is_detached() {
        let block = ControlBlock::observing(std::ptr::null(), identity());
        let notifier = DropNotifier::new();
        notifier.attach(&block);

        let copy = notifier.clone();
        assert!(!copy.is_attached());

        drop(copy);
        assert!(!block.is_destroyed());
    }

    #[test]
    fn test_dead_lineage_is_not_resurrected() {
        let notifier = DropNotifier::new();
        notifier.attach(&ControlBlock::observing(std::ptr::null(), identity()));

        assert!(!notifier.is_attached());
        assert!(notifier.lineage().is_none());
    }

    #[test]
    fn test_notified_into_inner_reports_destruction() {
        let block = ControlBlock::observing(std::ptr::null(), identity());
        let wrapped = Notified::new(7u32);
        wrapped.drop_notifier().attach(&block);

        assert_eq!(*wrapped, 7);
        assert_eq!(wrapped.into_inner(), 7);
        assert!(block.is_destroyed());
    }
}
