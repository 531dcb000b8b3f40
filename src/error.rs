use thiserror::Error;

/// Failures reported by [`OwnedPtr`](crate::OwnedPtr) operations.
///
/// All of them describe the state of a lineage, none are transient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("owned_pointer: this pointer is already acquired by a Box")]
    AlreadyAcquired,

    #[error("owned_pointer: this pointer is already deleted")]
    AlreadyDeleted,

    #[error("owned_pointer: the pointee is borrowed and cannot be acquired")]
    Borrowed,

    #[error("owned_pointer: null pointer")]
    Null,
}
