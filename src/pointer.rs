use std::ptr::NonNull;
use std::sync::Arc;

use crate::control::{ControlBlock, Deleter};
use crate::error::Error;
use crate::guard::Ref;
use crate::notify::{Identity, Tracked};

/// Shared, reference-counted handle whose pointee can be handed over to a
/// `Box` exactly once.
///
/// All clones of a handle form a *lineage* sharing one control block. Until
/// some clone calls [`acquire`](Self::acquire) the lineage owns the pointee
/// and deletes it together with its last handle. After that the `Box` owns
/// it and the handles merely observe the address; only [`Tracked`] pointees
/// report when that `Box` drops them.
pub struct OwnedPtr<T: ?Sized> {
    pub(crate) inner: Option<Lineage<T>>,
}

pub(crate) struct Lineage<T: ?Sized> {
    pub(crate) ptr: NonNull<T>,
    pub(crate) block: Arc<ControlBlock>,
}

impl<T: ?Sized> Clone for Lineage<T> {
    fn clone(&self) -> Self {
        Self {
            ptr: self.ptr,
            block: self.block.clone(),
        }
    }
}

// SAFETY: a handle gives shared access to the pointee from any thread and the
// last handle may drop it, exactly like `Arc<T>`.
unsafe impl<T: ?Sized + Send + Sync> Send for OwnedPtr<T> {}
unsafe impl<T: ?Sized + Send + Sync> Sync for OwnedPtr<T> {}

fn deleter_for<T: ?Sized + 'static>(ptr: NonNull<T>) -> Deleter {
    Box::new(move || {
        // SAFETY: `ptr` came from `Box::leak` and the control block runs its
        // deleter at most once, only while no `Box` owns the pointee.
        drop(unsafe { Box::from_raw(ptr.as_ptr()) });
    })
}

impl<T: ?Sized> OwnedPtr<T> {
    /// A handle with no pointee and no control block.
    pub const fn null() -> Self {
        Self { inner: None }
    }

    /// Takes ownership of `boxed`, starting a new lineage.
    ///
    /// The pointee is not tracked: once acquired, its destruction by the
    /// `Box` is invisible to the lineage. Use [`from_tracked`](Self::from_tracked)
    /// for pointees that carry a [`DropNotifier`](crate::DropNotifier).
    pub fn from_box(boxed: Box<T>) -> Self
    where
        T: 'static,
    {
        let ptr = NonNull::from(Box::leak(boxed));
        let block = ControlBlock::owning(ptr.as_ptr() as *const (), None, deleter_for(ptr));

        Self {
            inner: Some(Lineage { ptr, block }),
        }
    }

    /// Takes ownership of a tracked pointee.
    ///
    /// A pointee acquired earlier from a lineage that is still alive re-joins
    /// it, and that lineage becomes responsible for the deletion again instead
    /// of a second control block being created. The lineage is only re-joined
    /// when it handed out this very object: same address and same concrete
    /// type and layout. A notifier moved into another object starts a new
    /// lineage.
    pub fn from_tracked(boxed: Box<T>) -> Self
    where
        T: Tracked,
    {
        let identity = Identity::of(&*boxed);
        let existing = boxed.drop_notifier().lineage();
        let ptr = NonNull::from(Box::leak(boxed));
        let address = ptr.as_ptr() as *const ();

        let block = match existing {
            Some(block) if block.can_rejoin(address, &identity) => {
                block.readopt(deleter_for(ptr));
                block
            }
            _ => {
                let block = ControlBlock::owning(address, Some(identity), deleter_for(ptr));

                // SAFETY: the pointee was just leaked and is owned by `block`.
                unsafe { ptr.as_ref() }.drop_notifier().attach(&block);
                block
            }
        };

        Self {
            inner: Some(Lineage { ptr, block }),
        }
    }

    /// Observes a pointee owned by `boxed` without taking deletion
    /// responsibility. The lineage is acquired from the start.
    #[allow(clippy::borrowed_box)]
    pub fn link(boxed: &Box<T>) -> Self {
        let ptr = NonNull::from(&**boxed);
        let block = ControlBlock::observing(ptr.as_ptr() as *const (), None);

        Self {
            inner: Some(Lineage { ptr, block }),
        }
    }

    /// Like [`link`](Self::link), but learns when `boxed` drops the pointee.
    ///
    /// A pointee that was acquired from a lineage still alive joins that
    /// lineage again, under the same conditions as
    /// [`from_tracked`](Self::from_tracked). The lineage stays acquired.
    #[allow(clippy::borrowed_box)]
    pub fn link_tracked(boxed: &Box<T>) -> Self
    where
        T: Tracked,
    {
        let identity = Identity::of(&**boxed);
        let notifier = boxed.drop_notifier();
        let ptr = NonNull::from(&**boxed);
        let address = ptr.as_ptr() as *const ();

        let block = match notifier.lineage() {
            Some(block) if block.can_rejoin(address, &identity) => block,
            _ => {
                let block = ControlBlock::observing(address, Some(identity));
                notifier.attach(&block);
                block
            }
        };

        Self {
            inner: Some(Lineage { ptr, block }),
        }
    }

    /// Hands the pointee over to a `Box`.
    ///
    /// Succeeds once per lineage: every other handle of it observes
    /// [`is_acquired`](Self::is_acquired) afterwards. A null handle yields
    /// `Ok(None)` any number of times.
    ///
    /// # Errors
    ///
    /// * [`Error::AlreadyAcquired`] if some handle of the lineage already acquired it;
    /// * [`Error::Borrowed`] while a [`Ref`] of the lineage is alive.
    pub fn acquire(&self) -> Result<Option<Box<T>>, Error> {
        let lineage = match &self.inner {
            Some(lineage) => lineage,
            None => return Ok(None),
        };

        lineage.block.try_acquire()?;

        // SAFETY: the transition to ACQUIRED succeeded for this call only, so
        // the lineage gives up the allocation it got from `Box::leak`.
        Ok(Some(unsafe { Box::from_raw(lineage.ptr.as_ptr()) }))
    }

    /// Consuming form of [`acquire`](Self::acquire).
    pub fn into_box(self) -> Result<Option<Box<T>>, Error> {
        self.acquire()
    }

    /// Scoped shared access to the pointee while the lineage still owns it.
    ///
    /// # Errors
    ///
    /// * [`Error::Null`] for a null handle;
    /// * [`Error::AlreadyAcquired`] once a `Box` owns the pointee;
    /// * [`Error::AlreadyDeleted`] once the owning `Box` dropped it.
    pub fn borrow(&self) -> Result<Ref<'_, T>, Error> {
        let lineage = self.inner.as_ref().ok_or(Error::Null)?;
        lineage.block.pin()?;

        Ok(Ref::new(&lineage.block, lineage.ptr))
    }

    /// Address of the pointee, `Ok(None)` for a null handle.
    ///
    /// Reading through the pointer is up to the caller: after acquisition the
    /// owning `Box` decides how long it stays valid.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyDeleted`] once a tracked pointee was dropped by its `Box`.
    pub fn get(&self) -> Result<Option<NonNull<T>>, Error> {
        match &self.inner {
            None => Ok(None),
            Some(lineage) if lineage.block.is_destroyed() => Err(Error::AlreadyDeleted),
            Some(lineage) => Ok(Some(lineage.ptr)),
        }
    }

    /// Like [`get`](Self::get) but `None` once the pointee is known to be destroyed.
    #[inline]
    pub fn as_ptr(&self) -> Option<NonNull<T>> {
        self.get().ok().flatten()
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.inner.is_none()
    }

    #[inline]
    pub fn is_acquired(&self) -> bool {
        self.inner
            .as_ref()
            .map_or(false, |lineage| lineage.block.is_acquired())
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.inner
            .as_ref()
            .map_or(false, |lineage| lineage.block.is_destroyed())
    }

    /// Whether destruction after acquisition is observable for this lineage.
    #[inline]
    pub fn is_tracked(&self) -> bool {
        self.inner
            .as_ref()
            .map_or(false, |lineage| lineage.block.is_tracked())
    }

    /// Number of live handles in the lineage, `0` for a null handle.
    pub fn handle_count(&self) -> usize {
        self.inner
            .as_ref()
            .map_or(0, |lineage| Arc::strong_count(&lineage.block))
    }

    /// Whether both handles belong to the same lineage.
    pub fn same_lineage<U: ?Sized>(&self, other: &OwnedPtr<U>) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Arc::ptr_eq(&a.block, &b.block),
            (None, None) => true,
            _ => false,
        }
    }

    /// Resets this handle to null, dropping its share of the lineage.
    pub fn reset(&mut self) {
        self.inner = None;
    }
}

impl<T: ?Sized> Clone for OwnedPtr<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: ?Sized> Default for OwnedPtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized + 'static> From<Box<T>> for OwnedPtr<T> {
    fn from(boxed: Box<T>) -> Self {
        Self::from_box(boxed)
    }
}

impl<T: ?Sized + 'static> From<Option<Box<T>>> for OwnedPtr<T> {
    fn from(boxed: Option<Box<T>>) -> Self {
        boxed.map_or_else(Self::null, Self::from_box)
    }
}
