//! Work queue between the producer and the workers.
//!
//! A `VecDeque` under a mutex holds pending items; a condition variable lets
//! idle workers sleep until an item arrives or the queue is closed. The
//! deque's length is the semaphore count.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// One feed to ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Feed location handed to the fetcher.
    pub url: String,
}

impl WorkItem {
    #[inline]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[derive(Default)]
struct State {
    items: VecDeque<WorkItem>,
    closed: bool,
}

/// FIFO queue with blocking dequeue.
///
/// Any number of threads may dequeue. Enqueueing is meant for a single
/// producer; the pool only exposes it through [`WorkerPool`](super::WorkerPool).
#[derive(Default)]
pub struct WorkQueue {
    state: Mutex<State>,
    available: Condvar,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, State> {
        // The lock is never held across user code; poisoned state is intact.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an item and wakes one waiting worker.
    ///
    /// Returns false, dropping the item, if the queue was closed.
    pub fn push(&self, item: WorkItem) -> bool {
        let mut state = self.lock();
        if state.closed {
            return false;
        }
        state.items.push_back(item);
        drop(state);
        self.available.notify_one();
        true
    }

    /// Removes the oldest item, sleeping while the queue is empty.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub fn pop(&self) -> Option<WorkItem> {
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            if state.closed {
                return None;
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Removes the oldest item without waiting.
    pub fn try_pop(&self) -> Option<WorkItem> {
        self.lock().items.pop_front()
    }

    /// Stops accepting items and wakes every waiting worker.
    ///
    /// Items already queued are still handed out.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Items waiting to be dequeued.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
