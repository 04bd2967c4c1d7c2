//! Thread-safe FIFO order queue shared by every cook.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::EmptyQueue;
use crate::types::Order;

/// A minimal, synchronized FIFO queue of pending orders.
///
/// The lock is held only for the check-and-remove in [`OrderQueue::try_dequeue`],
/// never while an order is being cooked.
pub struct OrderQueue {
    inner: Mutex<OrderQueueState>,
}

struct OrderQueueState {
    queue: VecDeque<Order>,
    enqueued: usize,
    dequeued: usize,
}

impl OrderQueue {
    /// Create an empty order queue.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(OrderQueueState {
                queue: VecDeque::new(),
                enqueued: 0,
                dequeued: 0,
            }),
        }
    }

    /// Replace the queue contents with `orders`, resetting the counters.
    pub fn enqueue_all(&self, orders: impl IntoIterator<Item = Order>) {
        let mut guard = self.inner.lock().expect("order queue mutex poisoned");
        guard.queue.clear();
        guard.queue.extend(orders);
        guard.enqueued = guard.queue.len();
        guard.dequeued = 0;
    }

    /// Atomically remove and return the head order.
    pub fn try_dequeue(&self) -> Result<Order, EmptyQueue> {
        let mut guard = self.inner.lock().expect("order queue mutex poisoned");
        let order = guard.queue.pop_front().ok_or(EmptyQueue)?;
        guard.dequeued += 1;
        Ok(order)
    }

    /// Current number of queued orders.
    pub fn len(&self) -> usize {
        let guard = self.inner.lock().expect("order queue mutex poisoned");
        guard.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(enqueued, dequeued)` since the last `enqueue_all`.
    pub fn counters(&self) -> (usize, usize) {
        let guard = self.inner.lock().expect("order queue mutex poisoned");
        (guard.enqueued, guard.dequeued)
    }

    /// Pending order labels, head first.
    pub fn snapshot(&self) -> Vec<String> {
        let guard = self.inner.lock().expect("order queue mutex poisoned");
        guard.queue.iter().map(|order| order.label.clone()).collect()
    }
}

impl Default for OrderQueue {
    fn default() -> Self {
        Self::new()
    }
}
