//! Events delivered from the kitchen to the presentation layer.

use std::sync::Mutex;
use std::sync::mpsc::Sender;
use std::time::Duration;

use crate::types::{ExecutionMode, Order, SlotId};

/// Everything the presentation layer is told about a session.
#[derive(Clone, Debug, PartialEq)]
pub enum KitchenEvent {
    Started {
        slot: SlotId,
        order: Order,
    },
    Progress {
        slot: SlotId,
        order: Order,
        percent: u8,
    },
    Completed {
        slot: SlotId,
        order: Order,
        elapsed: Duration,
    },
    /// The work unit faulted; the slot moves on to the next order.
    Failed {
        slot: SlotId,
        order: Order,
        reason: String,
    },
    SessionFinished {
        mode: ExecutionMode,
        elapsed: Duration,
        processed: usize,
    },
}

impl KitchenEvent {
    /// Slot that produced the event, if it is slot-scoped.
    pub fn slot(&self) -> Option<SlotId> {
        match self {
            KitchenEvent::Started { slot, .. }
            | KitchenEvent::Progress { slot, .. }
            | KitchenEvent::Completed { slot, .. }
            | KitchenEvent::Failed { slot, .. } => Some(*slot),
            KitchenEvent::SessionFinished { .. } => None,
        }
    }
}

/// Receiver side of the presentation boundary.
///
/// Implementations must not block for long: cooks call `emit` from their own
/// threads between progress steps.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: KitchenEvent);
}

/// Forwards events over an mpsc channel to whoever owns the presentation loop.
///
/// A hung-up receiver is not an error for the kitchen; events are dropped.
pub struct ChannelSink {
    tx: Sender<KitchenEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<KitchenEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: KitchenEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("event receiver disconnected; dropping event");
        }
    }
}

/// Discards everything.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: KitchenEvent) {}
}

/// Keeps every event in memory, in arrival order.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<KitchenEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<KitchenEvent> {
        self.events.lock().expect("memory sink mutex poisoned").clone()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: KitchenEvent) {
        self.events
            .lock()
            .expect("memory sink mutex poisoned")
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn channel_sink_forwards_events() {
        let (tx, rx) = mpsc::channel();
        let sink = ChannelSink::new(tx);
        let order = Order::new(1, "Table 01: Ramen");
        sink.emit(KitchenEvent::Started {
            slot: 2,
            order: order.clone(),
        });
        let event = rx.recv().expect("event missing");
        assert_eq!(event.slot(), Some(2));
        assert_eq!(event, KitchenEvent::Started { slot: 2, order });
    }

    #[test]
    fn channel_sink_ignores_hung_up_receiver() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        // Must not panic.
        ChannelSink::new(tx).emit(KitchenEvent::SessionFinished {
            mode: ExecutionMode::Concurrent,
            elapsed: Duration::ZERO,
            processed: 0,
        });
    }
}
