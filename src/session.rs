//! Execution session bookkeeping and its final report.

use std::time::{Duration, Instant};

use crate::types::ExecutionMode;

/// Transient record of one run: created at start, turned into a report at the end.
#[derive(Clone, Debug)]
pub struct ExecutionSession {
    pub mode: ExecutionMode,
    pub cooks: usize,
    pub total_orders: usize,
    started_at: Instant,
}

impl ExecutionSession {
    pub fn start(mode: ExecutionMode, cooks: usize, total_orders: usize) -> Self {
        tracing::info!(%mode, cooks, total_orders, "session started");
        Self {
            mode,
            cooks,
            total_orders,
            started_at: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Aggregated metrics from a finished session.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionReport {
    pub mode: ExecutionMode,
    pub cooks: usize,
    pub total_orders: usize,
    /// Orders whose work unit completed.
    pub processed: usize,
    /// Orders whose work unit faulted.
    pub failed: usize,
    /// Orders never dequeued (non-zero only after a cancel).
    pub remaining: usize,
    pub elapsed: Duration,
    /// Completed orders per slot.
    pub per_slot: Vec<usize>,
    /// Highest number of slots observed busy at once.
    pub max_in_flight: usize,
    pub cancelled: bool,
    /// Orders handed to more than one slot; only tracked when validating.
    pub duplicate_deliveries: usize,
}

impl SessionReport {
    /// Completed orders per second.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed as f64 / secs
        } else {
            0.0
        }
    }

    /// Every order was dequeued exactly once.
    pub fn is_drained(&self) -> bool {
        self.remaining == 0 && self.processed + self.failed == self.total_orders
    }
}
