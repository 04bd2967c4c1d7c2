//! Sequential executor: the control case for the concurrent dispatcher.
//!
//! Orders are cooked one at a time on the caller's thread. When the caller is
//! the thread that also drives the presentation layer, nothing gets rendered
//! until the whole queue is done.

use crate::dispatcher::SlotMetrics;
use crate::events::{EventSink, KitchenEvent};
use crate::session::{ExecutionSession, SessionReport};
use crate::task_queue::OrderQueue;
use crate::types::{ExecutionMode, Order, SlotId};
use crate::work::{OrderProcessor, run_guarded};

/// The single slot used by the sequential mode.
pub const SEQUENTIAL_SLOT: SlotId = 0;

/// One cook, no threads.
pub struct SequentialExecutor {
    queue: OrderQueue,
    validate: bool,
}

impl SequentialExecutor {
    pub fn new() -> Self {
        Self {
            queue: OrderQueue::new(),
            validate: false,
        }
    }

    /// Track every dequeued label and count duplicate deliveries.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Replace the pending orders.
    pub fn enqueue_all(&self, orders: impl IntoIterator<Item = Order>) {
        self.queue.enqueue_all(orders);
    }

    /// Cook every queued order on the current thread, then report.
    pub fn run(&self, processor: &dyn OrderProcessor, sink: &dyn EventSink) -> SessionReport {
        let session = ExecutionSession::start(ExecutionMode::Sequential, 1, self.queue.len());
        let metrics = SlotMetrics::new(1, self.validate);

        while let Ok(order) = self.queue.try_dequeue() {
            metrics.begin(SEQUENTIAL_SLOT, &order);
            let outcome = run_guarded(processor, SEQUENTIAL_SLOT, &order, sink);
            metrics.end(SEQUENTIAL_SLOT, outcome.is_ok());
            if let Err(err) = outcome {
                tracing::warn!(order = %order, error = %err, "order failed; moving on");
                sink.emit(KitchenEvent::Failed {
                    slot: SEQUENTIAL_SLOT,
                    order,
                    reason: err.reason,
                });
            }
        }

        let elapsed = session.elapsed();
        let processed = metrics.processed();
        tracing::info!(
            mode = %session.mode,
            processed,
            elapsed_ms = elapsed.as_millis() as u64,
            "session finished"
        );
        sink.emit(KitchenEvent::SessionFinished {
            mode: session.mode,
            elapsed,
            processed,
        });

        SessionReport {
            mode: session.mode,
            cooks: session.cooks,
            total_orders: session.total_orders,
            processed,
            failed: metrics.failed(),
            remaining: self.queue.len(),
            elapsed,
            per_slot: metrics.per_slot(),
            max_in_flight: metrics.max_in_flight(),
            cancelled: false,
            duplicate_deliveries: metrics.duplicates(),
        }
    }
}

impl Default for SequentialExecutor {
    fn default() -> Self {
        Self::new()
    }
}
