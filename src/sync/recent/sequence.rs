//! The storage behind a [`RecentQueue`](super::RecentQueue).

use std::collections::{vec_deque, VecDeque};

/// An ordered sequence of values, oldest at the front.
///
/// `Sequence` has no synchronization of its own; the queue only touches it
/// while holding its lock.
#[derive(Debug)]
pub(super) struct Sequence<T> {
    inner: VecDeque<T>,
}

impl<T> Sequence<T> {
    /// Creates an empty sequence with room for `capacity` values.
    pub(super) fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: VecDeque::with_capacity(capacity),
        }
    }

    pub(super) fn push_back(&mut self, val: T) {
        self.inner.push_back(val);
    }

    pub(super) fn pop_front(&mut self) -> Option<T> {
        self.inner.pop_front()
    }

    pub(super) fn front(&self) -> Option<&T> {
        self.inner.front()
    }

    pub(super) fn get(&self, index: usize) -> Option<&T> {
        self.inner.get(index)
    }

    pub(super) fn len(&self) -> usize {
        self.inner.len()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub(super) fn clear(&mut self) {
        self.inner.clear();
    }

    pub(super) fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.inner.iter()
    }
}
