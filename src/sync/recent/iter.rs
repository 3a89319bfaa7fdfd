use std::iter::FusedIterator;

use super::RecentQueue;
use crate::{sync::IterError, trace::trace};

/// A fail-fast iterator over the values of a [`RecentQueue`], from head to
/// tail.
///
/// The iterator remembers the queue's modification count when it's created.
/// Every step re-checks it under the queue's lock, and any insertion, removal
/// or clear in the meantime makes the iterator fail with
/// [`IterError::Modified`] for good. Values are cloned out of the queue one
/// at a time.
///
/// As an [`Iterator`], it yields `Ok` values until the queue is exhausted,
/// or a single `Err(IterError::Modified)` after which it's fused.
///
/// # Examples
///
/// ```
/// use recent::sync::{IterError, RecentQueue};
///
/// let queue = RecentQueue::new(4);
/// queue.insert(1);
/// queue.insert(2);
///
/// let mut iter = queue.iter();
/// assert_eq!(Ok(1), iter.try_next());
/// queue.insert(3);
/// assert_eq!(Err(IterError::Modified), iter.has_next());
/// ```
pub struct Iter<'a, T> {
    queue: &'a RecentQueue<T>,
    expected: u64,
    cursor: usize,
    invalidated: bool,
    fused: bool,
}

impl<'a, T> Iter<'a, T> {
    pub(super) fn new(queue: &'a RecentQueue<T>) -> Self {
        let expected = queue.state.lock().modifications;
        Self {
            queue,
            expected,
            cursor: 0,
            invalidated: false,
            fused: false,
        }
    }
}

impl<T> Iter<'_, T> {
    fn validate(&mut self, modifications: u64) -> Result<(), IterError> {
        if !self.invalidated && modifications != self.expected {
            trace!(
                expected = self.expected,
                found = modifications,
                "iterator invalidated"
            );
            self.invalidated = true;
        }
        if self.invalidated {
            Err(IterError::Modified)
        } else {
            Ok(())
        }
    }

    /// Returns whether there are more values to visit, or
    /// [`IterError::Modified`] if the queue changed since the iterator was
    /// created.
    pub fn has_next(&mut self) -> Result<bool, IterError> {
        let queue = self.queue;
        let state = queue.state.lock();
        self.validate(state.modifications)?;
        Ok(self.cursor < state.elements.len())
    }

    /// Always fails with [`IterError::Unsupported`]; values can't be removed
    /// through an iterator.
    pub fn remove(&mut self) -> Result<(), IterError> {
        Err(IterError::Unsupported)
    }
}

impl<T: Clone> Iter<'_, T> {
    /// Returns the next value, [`IterError::Exhausted`] if there is none, or
    /// [`IterError::Modified`] if the queue changed since the iterator was
    /// created.
    pub fn try_next(&mut self) -> Result<T, IterError> {
        let queue = self.queue;
        let state = queue.state.lock();
        self.validate(state.modifications)?;
        let val = state
            .elements
            .get(self.cursor)
            .cloned()
            .ok_or(IterError::Exhausted)?;
        self.cursor += 1;
        Ok(val)
    }
}

impl<T: Clone> Iterator for Iter<'_, T> {
    type Item = Result<T, IterError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        match self.try_next() {
            Ok(val) => Some(Ok(val)),
            Err(IterError::Exhausted) => {
                self.fused = true;
                None
            }
            Err(err) => {
                self.fused = true;
                Some(Err(err))
            }
        }
    }
}

impl<T: Clone> FusedIterator for Iter<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_of(values: &[u32]) -> RecentQueue<u32> {
        let queue = RecentQueue::new(values.len().max(1));
        for &v in values {
            queue.insert(v);
        }
        queue
    }

    #[test]
    fn visits_every_value_once() {
        let queue = queue_of(&[1, 2, 3]);
        let mut iter = queue.iter();
        for expected in 1..=3 {
            assert_eq!(Ok(true), iter.has_next());
            assert_eq!(Ok(expected), iter.try_next());
        }
        assert_eq!(Ok(false), iter.has_next());
        assert_eq!(Err(IterError::Exhausted), iter.try_next());
    }

    #[test]
    fn collects_the_current_contents() {
        let queue = queue_of(&[4, 5, 6]);
        assert_eq!(Ok(vec![4, 5, 6]), queue.iter().collect::<Result<Vec<_>, _>>());
        assert_eq!(3, (&queue).into_iter().count());
    }

    #[test]
    fn empty_queue_yields_nothing() {
        let queue = RecentQueue::<u32>::new(2);
        let mut iter = queue.iter();
        assert_eq!(Ok(false), iter.has_next());
        assert_eq!(None, iter.next());
    }

    #[test]
    fn insert_invalidates_the_iterator() {
        let queue = queue_of(&[1, 2]);
        let mut iter = queue.iter();
        assert_eq!(Ok(1), iter.try_next());
        queue.insert(3);
        assert_eq!(Err(IterError::Modified), iter.has_next());
        assert_eq!(Err(IterError::Modified), iter.try_next());
    }

    #[test]
    fn eviction_that_keeps_the_size_invalidates_the_iterator() {
        let queue = queue_of(&[1, 2]);
        assert!(queue.is_full());
        let mut iter = queue.iter();
        queue.insert(3);
        assert_eq!(2, queue.size());
        assert_eq!(Err(IterError::Modified), iter.try_next());
    }

    #[test]
    fn removal_and_clear_invalidate_the_iterator() {
        let queue = queue_of(&[1, 2]);
        let mut iter = queue.iter();
        assert_eq!(Some(1), queue.try_remove());
        assert_eq!(Err(IterError::Modified), iter.has_next());

        let mut iter = queue.iter();
        queue.clear();
        assert_eq!(Err(IterError::Modified), iter.try_next());
    }

    #[test]
    fn stays_invalid_once_modified() {
        let queue = queue_of(&[1, 2]);
        let mut iter = queue.iter();
        queue.insert(3);
        assert_eq!(Err(IterError::Modified), iter.has_next());
        // Even though the queue is quiet again, the iterator is done for.
        assert_eq!(Err(IterError::Modified), iter.has_next());
    }

    #[test]
    fn iterator_reports_modification_once_then_ends() {
        let queue = queue_of(&[1, 2, 3]);
        let mut iter = queue.iter();
        assert_eq!(Some(Ok(1)), iter.next());
        queue.clear();
        assert_eq!(Some(Err(IterError::Modified)), iter.next());
        assert_eq!(None, iter.next());
    }

    #[test]
    fn remove_is_unsupported() {
        let queue = queue_of(&[1]);
        let mut iter = queue.iter();
        assert_eq!(Err(IterError::Unsupported), iter.remove());
        assert_eq!(Ok(1), iter.try_next());
        assert_eq!(Err(IterError::Unsupported), iter.remove());
        queue.insert(2);
        assert_eq!(Err(IterError::Unsupported), iter.remove());
    }
}
