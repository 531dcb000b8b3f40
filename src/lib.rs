//! Shared handles that can give their pointee away to a `Box` exactly once.
//!
//! [`OwnedPtr<T>`] behaves like an `Arc<T>` until some code needs sole
//! ownership of the pointee, typically to pass it to an API that takes a
//! `Box<T>`. [`OwnedPtr::acquire`] performs that hand-over once per lineage
//! (the set of clones of one handle); every clone observes it and later
//! attempts fail with [`Error::AlreadyAcquired`].
//!
//! ```text
//! SHARED --acquire()--> ACQUIRED --Box dropped (tracked types)--> ACQUIRED + DESTROYED
//!    |
//!    `--last handle dropped--> pointee deleted by the lineage
//! ```
//!
//! The pointee is deleted exactly once: by the lineage if it was never
//! acquired, otherwise by the `Box`. Only pointees implementing [`Tracked`]
//! tell the lineage when the `Box` dropped them; for all others the handles
//! keep reporting [`is_expired`](OwnedPtr::is_expired) `== false`.
//!
//! ```rust
//! use owned_pointer::{make_notified, Error};
//!
//! fn consume(_: Box<impl Sized>) {}
//!
//! let p = make_notified(String::from("payload"));
//! let observer = p.clone();
//!
//! assert_eq!(p.borrow().unwrap().as_str(), "payload");
//!
//! consume(p.acquire().unwrap().unwrap());
//!
//! assert!(observer.is_acquired());
//! assert!(observer.is_expired());
//! assert_eq!(observer.acquire().unwrap_err(), Error::AlreadyAcquired);
//! assert_eq!(observer.get().unwrap_err(), Error::AlreadyDeleted);
//! assert!(observer.as_ptr().is_none());
//! ```

mod cast;
mod cmp;
mod control;
pub mod error;
mod factory;
mod guard;
mod notify;
mod pointer;

pub use error::Error;
pub use factory::{link, link_tracked, make_notified, make_owned, make_tracked};
pub use guard::Ref;
pub use notify::{DropNotifier, Notified, Tracked};
pub use pointer::OwnedPtr;
