//! Shared record behind every handle of a lineage.
//!
//! The whole lifecycle lives in one state word:
//!
//! ```text
//! bit 0      ACQUIRED   the pointee was handed to a `Box`
//! bit 1      DESTROYED  a `DropNotifier` announced the pointee is gone
//! bits 2..   scoped borrows (`Ref`) currently alive
//! ```
//!
//! `ACQUIRED` and `DESTROYED` only ever move from 0 to 1 within one
//! ownership cycle; the only way back is re-adoption of the same allocation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Error;
use crate::notify::Identity;

const ACQUIRED: usize = 1;
const DESTROYED: usize = 1 << 1;
const BORROW: usize = 1 << 2;
const MAX_BORROWS: usize = usize::MAX >> 3;

/// Frees the pointee with the static type it was adopted with.
pub(crate) type Deleter = Box<dyn FnOnce()>;

pub(crate) struct ControlBlock {
    address: *const (),
    identity: Option<Identity>,
    state: AtomicUsize,
    deleter: Mutex<Option<Deleter>>,
}

// SAFETY: `address` is only compared, never dereferenced through the block.
// The deleter runs either from `Drop` (exclusive access) or is replaced under
// the mutex; handles are `Send`/`Sync` only when the pointee is `Send + Sync`,
// so the deleter never drops a value on a thread it may not be sent to.
unsafe impl Send for ControlBlock {}
unsafe impl Sync for ControlBlock {}

impl ControlBlock {
    /// A lineage responsible for deleting the pointee.
    pub(crate) fn owning(
        address: *const (),
        identity: Option<Identity>,
        deleter: Deleter,
    ) -> Arc<Self> {
        log::trace!(
            "owned_pointer {:p}: new lineage (tracked: {})",
            address,
            identity.is_some()
        );

        Arc::new(Self {
            address,
            identity,
            state: AtomicUsize::new(0),
            deleter: Mutex::new(Some(deleter)),
        })
    }

    /// A lineage observing a pointee some `Box` already owns.
    pub(crate) fn observing(address: *const (), identity: Option<Identity>) -> Arc<Self> {
        log::trace!(
            "owned_pointer {:p}: new linked lineage (tracked: {})",
            address,
            identity.is_some()
        );

        Arc::new(Self {
            address,
            identity,
            state: AtomicUsize::new(ACQUIRED),
            deleter: Mutex::new(None),
        })
    }

    #[inline]
    pub(crate) fn is_tracked(&self) -> bool {
        self.identity.is_some()
    }

    /// Whether a `Box` holding the object at `address` may join this lineage:
    /// the lineage must have handed exactly that object out and not have seen
    /// it destroyed. Anything else is a different object that merely carries a
    /// notifier moved out of ours.
    pub(crate) fn can_rejoin(&self, address: *const (), identity: &Identity) -> bool {
        let state = self.state.load(Ordering::Acquire);

        self.address == address
            && self.identity.as_ref() == Some(identity)
            && state & (ACQUIRED | DESTROYED) == ACQUIRED
    }

    #[inline]
    pub(crate) fn is_acquired(&self) -> bool {
        self.state.load(Ordering::Acquire) & ACQUIRED != 0
    }

    #[inline]
    pub(crate) fn is_destroyed(&self) -> bool {
        self.state.load(Ordering::Acquire) & DESTROYED != 0
    }

    /// One-shot transition to `ACQUIRED`. Exactly one caller per ownership
    /// cycle gets `Ok`, and never while a scoped borrow is alive.
    pub(crate) fn try_acquire(&self) -> Result<(), Error> {
        let mut state = self.state.load(Ordering::Acquire);

        loop {
            if state & ACQUIRED != 0 {
                return Err(Error::AlreadyAcquired);
            }

            if state >= BORROW {
                return Err(Error::Borrowed);
            }

            match self.state.compare_exchange_weak(
                state,
                state | ACQUIRED,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    log::trace!("owned_pointer {:p}: acquired", self.address);
                    return Ok(());
                }
                Err(current) => state = current,
            }
        }
    }

    pub(crate) fn mark_destroyed(&self) {
        log::trace!("owned_pointer {:p}: destroyed by its owner", self.address);
        self.state.fetch_or(DESTROYED, Ordering::Release);
    }

    /// Hands deletion responsibility back to the lineage.
    pub(crate) fn readopt(&self, deleter: Deleter) {
        *self.deleter.lock() = Some(deleter);
        self.state.fetch_and(!ACQUIRED, Ordering::AcqRel);

        log::trace!("owned_pointer {:p}: re-adopted", self.address);
    }

    pub(crate) fn pin(&self) -> Result<(), Error> {
        let mut state = self.state.load(Ordering::Acquire);

        loop {
            if state & DESTROYED != 0 {
                return Err(Error::AlreadyDeleted);
            }

            if state & ACQUIRED != 0 {
                return Err(Error::AlreadyAcquired);
            }

            assert!(state >> 2 < MAX_BORROWS, "owned_pointer: too many borrows");

            match self.state.compare_exchange_weak(
                state,
                state + BORROW,
                Ordering::Acquire,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(current) => state = current,
            }
        }
    }

    /// Adds a borrow next to one that is already held.
    #[inline]
    pub(crate) fn repin(&self) {
        let state = self.state.fetch_add(BORROW, Ordering::Relaxed);
        assert!(state >> 2 < MAX_BORROWS, "owned_pointer: too many borrows");
    }

    #[inline]
    pub(crate) fn unpin(&self) {
        self.state.fetch_sub(BORROW, Ordering::Release);
    }
}

impl Drop for ControlBlock {
    fn drop(&mut self) {
        let state = *self.state.get_mut();
        let deleter = self.deleter.get_mut().take();

        if state & ACQUIRED != 0 {
            log::trace!("owned_pointer {:p}: lineage ended, owned by a Box", self.address);
            return;
        }

        #[cfg(feature = "warn-unacquired")]
        log::warn!(
            "owned_pointer {:p}: lineage ended but its pointee was never acquired by a Box",
            self.address
        );

        if let Some(deleter) = deleter {
            log::trace!("owned_pointer {:p}: deleting pointee", self.address);
            deleter();
        }
    }
}
