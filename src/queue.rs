//! Thread-safe FIFO shared by all workers.
//!
//! One mutex guards the items and the closed flag; a condition variable wakes
//! blocked consumers when an item arrives or the queue closes. Every pushed
//! item is popped at most once, by exactly one caller.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Unbounded multi-producer, multi-consumer FIFO.
pub struct TaskQueue<T> {
    state: Mutex<QueueState<T>>,
    available: Condvar,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    // Every mutation is a single VecDeque call or flag store, so a poisoned
    // lock still guards a consistent state.
    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append to the tail. Never blocks on capacity.
    pub fn push(&self, item: T) {
        self.lock().items.push_back(item);
        self.available.notify_one();
    }

    /// Take the head, waiting while the queue is empty.
    ///
    /// Returns `None` only once the queue is closed and empty.
    pub fn pop(&self) -> Option<T> {
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
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Take the head if there is one, without waiting.
    pub fn try_pop(&self) -> Option<T> {
        self.lock().items.pop_front()
    }

    /// Remove and return everything still queued, in order.
    pub fn drain(&self) -> Vec<T> {
        self.lock().items.drain(..).collect()
    }

    /// Stop waiting consumers: blocked and future `pop` calls return `None`
    /// once the remaining items are gone.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Snapshot; may be stale by the time the caller looks at it.
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Snapshot; may be stale by the time the caller looks at it.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }
}
