//! A bounded multi-producer, multi-consumer queue that retains only the most
//! recently inserted values.
//!
//! Inserting into a full queue evicts the value at the head, so insertion
//! never blocks and never fails. Removal can either return immediately, block
//! the calling thread, or wait asynchronously until a value is available.

use std::{
    collections::HashMap,
    fmt, mem,
    task::{Context, Poll, Waker},
    time::{Duration, Instant},
};

use futures_util::future::poll_fn;
use parking_lot::{Condvar, Mutex};

use self::sequence::Sequence;
pub use self::iter::Iter;
use crate::{
    sync::{CapacityError, RecvError},
    trace::{debug, trace},
};

mod iter;
mod sequence;

/// The state guarded by the queue's lock.
struct State<T> {
    elements: Sequence<T>,
    /// Bumped on every structural change. Iterators compare against it.
    modifications: u64,
    /// Bumped by `interrupt_waiters`. A consumer that sees it change while
    /// waiting gives up.
    interrupts: u64,
    closed: bool,
    /// Async consumers waiting for the queue to become non-empty, keyed by
    /// the id their `Waiter` was registered with.
    wakers: HashMap<u64, Waker>,
    next_waiter: u64,
}

impl<T> State<T> {
    fn take_head(&mut self) -> Option<T> {
        let val = self.elements.pop_front()?;
        self.modifications = self.modifications.wrapping_add(1);
        Some(val)
    }

    /// Returns an error if a consumer that started waiting at `generation`
    /// must stop waiting.
    fn cancellation(&self, generation: u64) -> Result<(), RecvError> {
        if self.closed {
            Err(RecvError::Closed)
        } else if self.interrupts != generation {
            Err(RecvError::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Appends at the tail, evicting the head if the sequence holds
    /// `capacity` values.
    fn append(&mut self, val: T, capacity: usize) -> Option<T> {
        let evicted = if self.elements.len() < capacity {
            None
        } else {
            self.elements.pop_front()
        };
        self.elements.push_back(val);
        self.modifications = self.modifications.wrapping_add(1);
        evicted
    }
}

/// The registration of an async consumer. Its waker is removed from the
/// queue when the waiter completes or is dropped.
struct Waiter<'a, T> {
    queue: &'a RecentQueue<T>,
    generation: u64,
    key: Option<u64>,
}

impl<T> Waiter<'_, T> {
    fn poll_remove(&mut self, cx: &mut Context<'_>) -> Poll<Result<T, RecvError>> {
        let queue = self.queue;
        let mut state = queue.state.lock();
        if let Some(val) = state.take_head() {
            self.deregister(&mut state);
            return Poll::Ready(Ok(val));
        }
        if let Err(err) = state.cancellation(self.generation) {
            self.deregister(&mut state);
            debug!(%err, "async consumer cancelled");
            return Poll::Ready(Err(err));
        }
        // Wakers are taken out of the map when the queue wakes them, so a
        // re-polled waiter may have to register again.
        if let Some(waker) = self.key.and_then(|key| state.wakers.get_mut(&key)) {
            if !waker.will_wake(cx.waker()) {
                *waker = cx.waker().clone();
            }
        } else {
            let key = state.next_waiter;
            state.next_waiter = key.wrapping_add(1);
            state.wakers.insert(key, cx.waker().clone());
            self.key = Some(key);
        }
        Poll::Pending
    }

    fn deregister(&mut self, state: &mut State<T>) {
        if let Some(key) = self.key.take() {
            state.wakers.remove(&key);
        }
    }
}

impl<T> Drop for Waiter<'_, T> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.queue.state.lock().wakers.remove(&key);
        }
    }
}

/// A bounded FIFO queue holding the `capacity` most recently inserted values.
///
/// All operations go through a single lock. Share it between threads with an
/// [`Arc`](std::sync::Arc) or scoped threads.
///
/// # Examples
///
/// ```
/// use recent::sync::RecentQueue;
///
/// let queue = RecentQueue::new(2);
/// queue.insert(1);
/// queue.insert(2);
/// queue.insert(3);
/// assert_eq!(vec![2, 3], queue.snapshot());
/// assert_eq!(Ok(2), queue.remove_blocking());
/// ```
pub struct RecentQueue<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
    capacity: usize,
}

impl<T> RecentQueue<T> {
    /// Creates an empty queue retaining at most `capacity` values.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        match Self::try_new(capacity) {
            Ok(queue) => queue,
            Err(err) => panic!("{err}"),
        }
    }

    /// Creates an empty queue retaining at most `capacity` values, or returns
    /// an error if `capacity` is zero.
    pub fn try_new(capacity: usize) -> Result<Self, CapacityError> {
        if capacity == 0 {
            return Err(CapacityError);
        }
        Ok(Self {
            state: Mutex::new(State {
                elements: Sequence::with_capacity(capacity),
                modifications: 0,
                interrupts: 0,
                closed: false,
                wakers: HashMap::new(),
                next_waiter: 0,
            }),
            not_empty: Condvar::new(),
            capacity,
        })
    }

    /// Appends a value at the tail, evicting the head if the queue is full.
    /// Always returns `true`.
    pub fn insert(&self, val: T) -> bool {
        drop(self.push(val));
        true
    }

    /// Appends a value at the tail, returning the head if it had to be
    /// evicted to make room.
    pub fn push(&self, val: T) -> Option<T> {
        let (evicted, wakers) = {
            let mut state = self.state.lock();
            let evicted = state.append(val, self.capacity);
            if evicted.is_some() {
                trace!(capacity = self.capacity, "evicted the head of a full queue");
            }
            self.not_empty.notify_all();
            (evicted, mem::take(&mut state.wakers))
        };
        wakers.into_values().for_each(Waker::wake);
        evicted
    }

    /// Appends every value in order, taking the lock once. Values that don't
    /// fit evict the head as [`insert`](Self::insert) does, including values
    /// from the same batch. Returns true if any value was inserted.
    pub fn insert_all<I: IntoIterator<Item = T>>(&self, values: I) -> bool {
        // Collected first so the caller's iterator never runs under the lock.
        let values: Vec<T> = values.into_iter().collect();
        if values.is_empty() {
            return false;
        }
        let (evicted, wakers) = {
            let mut state = self.state.lock();
            let evicted: Vec<T> = values
                .into_iter()
                .filter_map(|val| state.append(val, self.capacity))
                .collect();
            trace!(evicted = evicted.len(), "inserted a batch");
            self.not_empty.notify_all();
            (evicted, mem::take(&mut state.wakers))
        };
        wakers.into_values().for_each(Waker::wake);
        drop(evicted);
        true
    }

    /// Removes the head of the queue, blocking the calling thread while the
    /// queue is empty.
    ///
    /// Returns an error if the queue is closed while empty, or if the wait is
    /// cancelled by [`interrupt_waiters`](Self::interrupt_waiters).
    pub fn remove_blocking(&self) -> Result<T, RecvError> {
        let mut state = self.state.lock();
        let generation = state.interrupts;
        loop {
            if let Some(val) = state.take_head() {
                return Ok(val);
            }
            if let Err(err) = state.cancellation(generation) {
                debug!(%err, "blocked consumer cancelled");
                return Err(err);
            }
            // Another consumer may win the value we're woken for, so loop.
            self.not_empty.wait(&mut state);
        }
    }

    /// Removes the head of the queue, waiting at most `timeout` for a value.
    /// Returns `Ok(None)` if no value arrived in time.
    pub fn remove_timeout(&self, timeout: Duration) -> Result<Option<T>, RecvError> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.remove_blocking().map(Some);
        };
        let mut state = self.state.lock();
        let generation = state.interrupts;
        loop {
            if let Some(val) = state.take_head() {
                return Ok(Some(val));
            }
            if let Err(err) = state.cancellation(generation) {
                debug!(%err, "timed consumer cancelled");
                return Err(err);
            }
            if self.not_empty.wait_until(&mut state, deadline).timed_out()
                && state.elements.is_empty()
            {
                return Ok(None);
            }
        }
    }

    /// Removes the head of the queue without waiting.
    pub fn try_remove(&self) -> Option<T> {
        self.state.lock().take_head()
    }

    /// Removes the head of the queue, waiting asynchronously while the queue
    /// is empty. Dropping the future cancels the wait and unregisters its
    /// waker.
    pub async fn remove_async(&self) -> Result<T, RecvError> {
        let mut waiter = Waiter {
            queue: self,
            generation: self.state.lock().interrupts,
            key: None,
        };
        poll_fn(|cx| waiter.poll_remove(cx)).await
    }

    /// Removes every value from the queue.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        trace!(size = state.elements.len(), "clearing queue");
        state.elements.clear();
        state.modifications = state.modifications.wrapping_add(1);
    }

    /// Closes the queue. Consumers waiting on an empty queue, and any that
    /// call a blocking removal afterwards, get [`RecvError::Closed`] instead
    /// of waiting. Values still in the queue can be removed, and insertion
    /// keeps working.
    pub fn close(&self) {
        let wakers = {
            let mut state = self.state.lock();
            state.closed = true;
            self.not_empty.notify_all();
            mem::take(&mut state.wakers)
        };
        debug!(waiters = wakers.len(), "queue closed");
        wakers.into_values().for_each(Waker::wake);
    }

    /// Returns true if [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Cancels the consumers currently waiting on an empty queue, which get
    /// [`RecvError::Interrupted`]. Consumers that start waiting afterwards
    /// are unaffected. A consumer that finds a value once it wakes up takes
    /// the value instead.
    pub fn interrupt_waiters(&self) {
        let wakers = {
            let mut state = self.state.lock();
            state.interrupts = state.interrupts.wrapping_add(1);
            self.not_empty.notify_all();
            mem::take(&mut state.wakers)
        };
        debug!(waiters = wakers.len(), "interrupting waiters");
        wakers.into_values().for_each(Waker::wake);
    }

    /// Returns the number of values in the queue.
    #[inline]
    pub fn size(&self) -> usize {
        self.state.lock().elements.len()
    }

    /// Returns the capacity of the queue.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true if the queue is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns true if the next insertion will evict a value.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.size() == self.capacity
    }

    /// Returns a fail-fast iterator over the values in the queue, from head to
    /// tail. See [`Iter`].
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }
}

impl<T: Clone> RecentQueue<T> {
    /// Returns a copy of the head of the queue, without removing it.
    pub fn peek(&self) -> Option<T> {
        self.state.lock().elements.front().cloned()
    }

    /// Returns a copy of all values in the queue, from head to tail.
    pub fn snapshot(&self) -> Vec<T> {
        self.state.lock().elements.iter().cloned().collect()
    }
}

impl<T: PartialEq> RecentQueue<T> {
    /// Returns true if the queue holds a value equal to `val`.
    pub fn contains(&self, val: &T) -> bool {
        self.state.lock().elements.iter().any(|v| v == val)
    }
}

impl<T> Extend<T> for RecentQueue<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.insert_all(iter);
    }
}

impl<T: fmt::Debug> RecentQueue<T> {
    /// Renders the size and the contents of the queue, for diagnostics.
    pub fn describe(&self) -> String {
        format!("{self:?}")
    }
}

impl<T: fmt::Debug> fmt::Debug for RecentQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        write!(f, "size: {}, contents (head -> tail): ", state.elements.len())?;
        f.debug_list().entries(state.elements.iter()).finish()
    }
}

impl<'a, T: Clone> IntoIterator for &'a RecentQueue<T> {
    type Item = Result<T, crate::sync::IterError>;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
