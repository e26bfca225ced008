//! Engine statistics
//!
//! Counters are lock-free atomics; the latency histogram sits behind a
//! mutex taken once per processed order.

use std::sync::atomic::{AtomicU64, Ordering};

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;

/// Latency recorder over processing times in nanoseconds.
#[derive(Debug)]
pub struct LatencyTracker {
    histogram: Histogram<u64>,
    max_ns: u64,
    total_ns: u128,
    count: u64,
}

impl LatencyTracker {
    pub fn new() -> Self {
        Self {
            // 1ns to 60s, three significant figures.
            histogram: Histogram::new_with_bounds(1, 60_000_000_000, 3)
                .expect("histogram bounds are static"),
            max_ns: 0,
            total_ns: 0,
            count: 0,
        }
    }

    pub fn record(&mut self, latency_ns: u64) {
        self.histogram.saturating_record(latency_ns.max(1));
        self.max_ns = self.max_ns.max(latency_ns);
        self.total_ns += latency_ns as u128;
        self.count += 1;
    }

    pub fn snapshot(&self) -> LatencySnapshot {
        LatencySnapshot {
            count: self.count,
            avg_ns: if self.count == 0 {
                0
            } else {
                (self.total_ns / self.count as u128) as u64
            },
            max_ns: self.max_ns,
            p50_ns: self.histogram.value_at_quantile(0.50),
            p99_ns: self.histogram.value_at_quantile(0.99),
        }
    }
}

impl Default for LatencyTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time latency aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LatencySnapshot {
    pub count: u64,
    pub avg_ns: u64,
    pub max_ns: u64,
    pub p50_ns: u64,
    pub p99_ns: u64,
}

/// Shared engine counters.
#[derive(Debug, Default)]
pub struct EngineStats {
    orders_processed: AtomicU64,
    orders_rejected: AtomicU64,
    trades_executed: AtomicU64,
    volume: Mutex<Decimal>,
    latency: Mutex<LatencyTracker>,
}

impl EngineStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed order: its trades and end-to-end latency.
    pub fn record_processed(&self, trade_count: usize, traded_volume: Decimal, latency_ns: u64) {
        self.orders_processed.fetch_add(1, Ordering::Relaxed);
        self.trades_executed
            .fetch_add(trade_count as u64, Ordering::Relaxed);
        if !traded_volume.is_zero() {
            *self.volume.lock() += traded_volume;
        }
        self.latency.lock().record(latency_ns);
    }

    pub fn record_rejected(&self) {
        self.orders_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            orders_processed: self.orders_processed.load(Ordering::Relaxed),
            orders_rejected: self.orders_rejected.load(Ordering::Relaxed),
            trades_executed: self.trades_executed.load(Ordering::Relaxed),
            volume: *self.volume.lock(),
            latency: self.latency.lock().snapshot(),
        }
    }
}

/// Point-in-time view of all engine counters.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub orders_processed: u64,
    pub orders_rejected: u64,
    pub trades_executed: u64,
    pub volume: Decimal,
    pub latency: LatencySnapshot,
}
