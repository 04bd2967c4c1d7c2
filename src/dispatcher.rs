//! Concurrent dispatcher: a fixed roster of cooks fed from one shared queue.
//!
//! Every slot gets its first order up front, on the starting thread. Each slot
//! then runs an explicit loop on its own thread: cook, check for cancellation,
//! dequeue under the queue lock, release the lock, repeat. The last slot to go
//! idle concludes the session.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;
use std::time::Duration;

use crate::error::{KitchenError, Result};
use crate::events::{EventSink, KitchenEvent};
use crate::session::{ExecutionSession, SessionReport};
use crate::task_queue::OrderQueue;
use crate::types::{ExecutionMode, Order, SlotId};
use crate::work::{OrderProcessor, run_guarded};

/// Per-slot bookkeeping shared by every cook of a session.
pub(crate) struct SlotMetrics {
    busy: AtomicUsize,
    max_busy: AtomicUsize,
    processed: AtomicUsize,
    failed: AtomicUsize,
    per_slot: Vec<AtomicUsize>,
    slot_busy: Vec<AtomicBool>,
    overlap: AtomicBool,
    seen: Option<Mutex<HashSet<String>>>,
    duplicates: AtomicUsize,
}

impl SlotMetrics {
    pub(crate) fn new(slots: usize, validate: bool) -> Self {
        Self {
            busy: AtomicUsize::new(0),
            max_busy: AtomicUsize::new(0),
            processed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            per_slot: (0..slots).map(|_| AtomicUsize::new(0)).collect(),
            slot_busy: (0..slots).map(|_| AtomicBool::new(false)).collect(),
            overlap: AtomicBool::new(false),
            seen: validate.then(|| Mutex::new(HashSet::new())),
            duplicates: AtomicUsize::new(0),
        }
    }

    /// Mark `slot` busy with `order`.
    pub(crate) fn begin(&self, slot: SlotId, order: &Order) {
        if self.slot_busy[slot].swap(true, Ordering::SeqCst) {
            // A slot never holds two orders at once.
            self.overlap.store(true, Ordering::SeqCst);
        }
        if let Some(seen) = self.seen.as_ref() {
            let mut guard = seen.lock().expect("seen mutex poisoned");
            if !guard.insert(order.label.clone()) {
                self.duplicates.fetch_add(1, Ordering::SeqCst);
            }
        }
        let current = self.busy.fetch_add(1, Ordering::SeqCst) + 1;
        let mut prev = self.max_busy.load(Ordering::SeqCst);
        while current > prev {
            match self.max_busy.compare_exchange(
                prev,
                current,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(next) => prev = next,
            }
        }
    }

    /// Mark `slot` idle again and record the outcome.
    pub(crate) fn end(&self, slot: SlotId, completed: bool) {
        if completed {
            self.per_slot[slot].fetch_add(1, Ordering::SeqCst);
            self.processed.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        let prev = self.busy.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(prev > 0, "busy counter underflow");
        self.slot_busy[slot].store(false, Ordering::SeqCst);
    }

    pub(crate) fn processed(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }

    pub(crate) fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.busy.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_busy.load(Ordering::SeqCst)
    }

    pub(crate) fn per_slot(&self) -> Vec<usize> {
        self.per_slot
            .iter()
            .map(|count| count.load(Ordering::SeqCst))
            .collect()
    }

    pub(crate) fn has_overlap(&self) -> bool {
        self.overlap.load(Ordering::SeqCst)
    }

    pub(crate) fn duplicates(&self) -> usize {
        self.duplicates.load(Ordering::SeqCst)
    }
}

/// Owns the order queue and hands its orders to `cooks` concurrent slots.
pub struct Dispatcher {
    queue: Arc<OrderQueue>,
    cooks: usize,
    validate: bool,
}

impl Dispatcher {
    pub fn new(cooks: usize) -> Self {
        Self {
            queue: Arc::new(OrderQueue::new()),
            cooks,
            validate: false,
        }
    }

    /// Track every dequeued label and count duplicate deliveries.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn cooks(&self) -> usize {
        self.cooks
    }

    /// Replace the pending orders.
    pub fn enqueue_all(&self, orders: impl IntoIterator<Item = Order>) {
        self.queue.enqueue_all(orders);
        tracing::debug!(pending = self.queue.len(), "orders loaded");
    }

    /// Pending order labels, head first.
    pub fn pending(&self) -> Vec<String> {
        self.queue.snapshot()
    }

    /// Start a session on background threads and return immediately.
    ///
    /// Each slot is handed its first order here, before any thread starts, so
    /// with K cooks and N orders exactly min(K, N) slots begin busy. After that a
    /// slot takes the next queued order as soon as it is idle, and the slot that
    /// goes idle last emits `SessionFinished`.
    pub fn start(
        &self,
        processor: Arc<dyn OrderProcessor>,
        sink: Arc<dyn EventSink>,
    ) -> Result<SessionHandle> {
        if self.cooks == 0 {
            return Err(KitchenError::InvalidConfiguration(
                "dispatcher needs at least one cook".to_string(),
            ));
        }

        let session =
            ExecutionSession::start(ExecutionMode::Concurrent, self.cooks, self.queue.len());
        let shared = Arc::new(SessionShared {
            queue: Arc::clone(&self.queue),
            metrics: SlotMetrics::new(self.cooks, self.validate),
            cancelled: AtomicBool::new(false),
            active_slots: AtomicUsize::new(self.cooks),
            finished: OnceLock::new(),
            session,
            processor,
            sink,
        });

        // Fan out before any cook runs: every slot pops once, in slot order, so
        // min(cooks, orders) slots start busy.
        let first_orders: Vec<Option<Order>> =
            (0..self.cooks).map(|slot| shared.next_order(slot)).collect();

        let mut handles = Vec::with_capacity(self.cooks);
        let mut pending = first_orders.into_iter().enumerate();
        while let Some((slot, first)) = pending.next() {
            let kept = first.clone();
            let slot_shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("cook-{}", slot + 1))
                .spawn(move || run_slot(&slot_shared, slot, first));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    tracing::error!(slot, error = %err, "failed to spawn cook thread");
                    shared.cancelled.store(true, Ordering::SeqCst);
                    // Slots that never started fail their first order and count as idle.
                    for (slot, first) in std::iter::once((slot, kept)).chain(pending) {
                        if let Some(order) = first {
                            shared.abandon(slot, order, "cook thread could not be spawned");
                        }
                        shared.slot_idle();
                    }
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(KitchenError::SpawnFailed(err));
                }
            }
        }

        Ok(SessionHandle { shared, handles })
    }

    /// Start a session and block until it finishes.
    pub fn run(
        &self,
        processor: Arc<dyn OrderProcessor>,
        sink: Arc<dyn EventSink>,
    ) -> Result<SessionReport> {
        self.start(processor, sink)?.wait()
    }
}

struct SessionShared {
    queue: Arc<OrderQueue>,
    metrics: SlotMetrics,
    cancelled: AtomicBool,
    active_slots: AtomicUsize,
    finished: OnceLock<Duration>,
    session: ExecutionSession,
    processor: Arc<dyn OrderProcessor>,
    sink: Arc<dyn EventSink>,
}

impl SessionShared {
    /// Pop the next order for `slot` and mark the slot busy with it.
    fn next_order(&self, slot: SlotId) -> Option<Order> {
        if self.cancelled.load(Ordering::SeqCst) {
            tracing::debug!(slot, "cancelled; cook stops");
            return None;
        }
        // The queue lock is released before cooking starts.
        let Ok(order) = self.queue.try_dequeue() else {
            tracing::debug!(slot, "queue empty; cook goes idle");
            return None;
        };
        tracing::debug!(slot, order = %order, "cook picked up order");
        self.metrics.begin(slot, &order);
        Some(order)
    }

    /// Fail an order that was handed to `slot` but will never be cooked.
    fn abandon(&self, slot: SlotId, order: Order, reason: &str) {
        self.metrics.end(slot, false);
        tracing::warn!(slot, order = %order, reason, "order abandoned");
        self.sink.emit(KitchenEvent::Failed {
            slot,
            order,
            reason: reason.to_string(),
        });
    }

    /// Called once per slot when it stops asking for work.
    fn slot_idle(&self) {
        if self.active_slots.fetch_sub(1, Ordering::SeqCst) != 1 {
            return;
        }
        // Last idle slot: conclude the session exactly once.
        let elapsed = *self.finished.get_or_init(|| self.session.elapsed());
        let processed = self.metrics.processed();
        tracing::info!(
            mode = %self.session.mode,
            processed,
            failed = self.metrics.failed(),
            elapsed_ms = elapsed.as_millis() as u64,
            "session finished"
        );
        self.sink.emit(KitchenEvent::SessionFinished {
            mode: self.session.mode,
            elapsed,
            processed,
        });
    }
}

/// Marks its slot idle when dropped, even if the slot thread unwinds.
struct IdleGuard<'a>(&'a SessionShared);

impl Drop for IdleGuard<'_> {
    fn drop(&mut self) {
        self.0.slot_idle();
    }
}

/// Cook `first` (already marked busy by `start`), then keep pulling orders
/// until the queue is empty or the session is cancelled.
fn run_slot(shared: &SessionShared, slot: SlotId, first: Option<Order>) {
    let _idle = IdleGuard(shared);
    let mut next = first;
    while let Some(order) = next {
        let outcome = run_guarded(
            shared.processor.as_ref(),
            slot,
            &order,
            shared.sink.as_ref(),
        );
        shared.metrics.end(slot, outcome.is_ok());

        match outcome {
            Ok(elapsed) => {
                tracing::debug!(
                    slot,
                    order = %order,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "order completed"
                );
            }
            Err(err) => {
                tracing::warn!(slot, order = %order, error = %err, "order failed; cook moves on");
                shared.sink.emit(KitchenEvent::Failed {
                    slot,
                    order,
                    reason: err.reason,
                });
            }
        }
        next = shared.next_order(slot);
    }
}

/// A running concurrent session.
pub struct SessionHandle {
    shared: Arc<SessionShared>,
    handles: Vec<thread::JoinHandle<()>>,
}

impl SessionHandle {
    /// Stop handing out orders; orders already being cooked still finish.
    pub fn cancel(&self) {
        tracing::info!("session cancellation requested");
        self.shared.cancelled.store(true, Ordering::SeqCst);
    }

    /// Every slot has gone idle.
    pub fn is_finished(&self) -> bool {
        self.shared.active_slots.load(Ordering::SeqCst) == 0
    }

    /// Orders currently being cooked.
    pub fn in_flight(&self) -> usize {
        self.shared.metrics.in_flight()
    }

    /// Wait for every slot and build the report.
    pub fn wait(self) -> Result<SessionReport> {
        let mut panicked = false;
        for handle in self.handles {
            if handle.join().is_err() {
                panicked = true;
            }
        }
        if panicked {
            return Err(KitchenError::SessionPanicked);
        }

        let shared = &self.shared;
        let metrics = &shared.metrics;
        debug_assert!(!metrics.has_overlap(), "slot held two orders at once");
        let elapsed = shared
            .finished
            .get()
            .copied()
            .unwrap_or_else(|| shared.session.elapsed());
        Ok(SessionReport {
            mode: shared.session.mode,
            cooks: shared.session.cooks,
            total_orders: shared.session.total_orders,
            processed: metrics.processed(),
            failed: metrics.failed(),
            remaining: shared.queue.len(),
            elapsed,
            per_slot: metrics.per_slot(),
            max_in_flight: metrics.max_in_flight(),
            cancelled: shared.cancelled.load(Ordering::SeqCst),
            duplicate_deliveries: metrics.duplicates(),
        })
    }
}
