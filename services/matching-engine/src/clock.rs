//! Nanosecond clocks
//!
//! Ingress timestamps use a process-monotonic clock so latency math
//! never goes backwards; trade timestamps use wall-clock time.

use std::sync::OnceLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

static PROCESS_START: OnceLock<Instant> = OnceLock::new();

/// Nanoseconds since process start. Monotonic.
pub fn monotonic_ns() -> i64 {
    PROCESS_START.get_or_init(Instant::now).elapsed().as_nanos() as i64
}

/// Unix wall-clock nanoseconds.
pub fn wall_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}
