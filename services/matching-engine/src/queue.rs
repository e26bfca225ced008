//! Bounded ingress queue
//!
//! Multi-producer/multi-consumer ring decoupling submitters from the
//! matching workers. `push` never blocks; backpressure is reported as
//! `QueueFull` and the submitter decides whether to retry.

use crossbeam::queue::ArrayQueue;
use types::errors::EngineError;
use types::order::Order;

/// Bounded MPMC queue of pending orders.
///
/// Capacity is rounded up to a power of two. Each popped order is owned
/// by exactly one worker.
#[derive(Debug)]
pub struct IngressQueue {
    inner: ArrayQueue<Order>,
}

impl IngressQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2).next_power_of_two();
        Self {
            inner: ArrayQueue::new(capacity),
        }
    }

    /// Enqueue an order; fails fast when the ring is full.
    pub fn push(&self, order: Order) -> Result<(), EngineError> {
        self.inner.push(order).map_err(|_| EngineError::QueueFull)
    }

    pub fn pop(&self) -> Option<Order> {
        self.inner.pop()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}
