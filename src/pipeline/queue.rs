//! Bounded pending-event queue
//!
//! Events wait here between parsing and enrichment. Under sustained
//! overload the queue keeps the newest events and sheds the oldest pending
//! one, trading completeness for freshness. Every shed event is returned to
//! the caller so it can be counted; nothing is dropped silently.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

/// Bounded FIFO with a drop-oldest overflow policy
pub struct EventQueue<T> {
    capacity: usize,
    buffer: Mutex<VecDeque<T>>,
    notify: Notify,
    dropped: AtomicU64,
}

impl<T> EventQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            buffer: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            dropped: AtomicU64::new(0),
        }
    }

    /// Push an event, returning the oldest pending event when the queue was
    /// full and had to shed it.
    pub fn push(&self, item: T) -> Option<T> {
        let shed = {
            let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());

            let shed = if buffer.len() >= self.capacity {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                buffer.pop_front()
            } else {
                None
            };

            buffer.push_back(item);
            shed
        };

        self.notify.notify_one();
        shed
    }

    /// Wait for the next event in receipt order
    pub async fn pop(&self) -> T {
        loop {
            // Register for a wakeup before checking, so a push between the
            // check and the await is not lost
            let notified = self.notify.notified();

            if let Some(item) = self.try_pop() {
                return item;
            }

            notified.await;
        }
    }

    /// Take the next event without waiting
    pub fn try_pop(&self) -> Option<T> {
        self.buffer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }

    /// Current number of pending events
    pub fn len(&self) -> usize {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total events shed to overflow since startup
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
