//! Response routing
//!
//! Workers emit responses on engine threads; API handlers await them on
//! the runtime. The router keeps a bounded window of recent responses
//! so a handler can claim its order's response whether it arrives
//! before or after the handler starts waiting.

use std::collections::VecDeque;
use std::time::Duration;

use dashmap::DashMap;
use matching_engine::ResponseSink;
use parking_lot::Mutex;
use types::ids::OrderId;
use types::order::OrderResponse;

const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Holds responses until their submitter claims them.
pub struct ResponseRouter {
    pending: DashMap<OrderId, OrderResponse>,
    /// Insertion order, for eviction once `capacity` is exceeded.
    arrivals: Mutex<VecDeque<OrderId>>,
    capacity: usize,
}

impl ResponseRouter {
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: DashMap::new(),
            arrivals: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    /// Claim the response for one order, waiting up to `timeout`.
    pub async fn claim(&self, order_id: OrderId, timeout: Duration) -> Option<OrderResponse> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some((_, response)) = self.pending.remove(&order_id) {
                return Some(response);
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl ResponseSink for ResponseRouter {
    fn on_response(&self, response: &OrderResponse) {
        self.pending.insert(response.order_id, response.clone());

        let mut arrivals = self.arrivals.lock();
        arrivals.push_back(response.order_id);
        // Unclaimed responses (text-protocol flow) age out here.
        while arrivals.len() > self.capacity {
            if let Some(old) = arrivals.pop_front() {
                self.pending.remove(&old);
            }
        }
    }
}
