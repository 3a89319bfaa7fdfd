//! Synchronization utilities.

use thiserror::Error;

pub mod recent;

pub use self::recent::{Iter, RecentQueue};

/// An error returned when constructing a queue that can't hold any value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("queue capacity must be greater than zero")]
pub struct CapacityError;

/// An error that may be emitted by a consumer waiting for a value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum RecvError {
    /// The queue was closed and is empty, so no value will ever arrive.
    #[error("receiving on a closed, empty queue")]
    Closed,
    /// The wait was cancelled by [`RecentQueue::interrupt_waiters`].
    #[error("receive was interrupted while waiting")]
    Interrupted,
}

/// An error that may be emitted while traversing a queue with an [`Iter`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum IterError {
    /// The queue was modified after the iterator was created. The iterator
    /// can't be used anymore.
    #[error("queue was modified during iteration")]
    Modified,
    /// Every value observed by the iterator was already returned.
    #[error("no more values to iterate")]
    Exhausted,
    /// The iterator is read-only.
    #[error("removal through the iterator is not supported")]
    Unsupported,
}
