//! Shared identifiers and the order model used across the kitchen.

use std::fmt;

/// Index of a worker slot (a cook). Slots are numbered `0..cooks`.
pub type SlotId = usize;
/// 1-based table number an order was generated for.
pub type TableNumber = u32;

/// Unit of simulated work: one dish for one table.
///
/// The label is the order's identity; the table number only feeds the
/// reproducible jitter when a seed is configured.
#[derive(Clone, Debug)]
pub struct Order {
    /// Table number the order was generated for.
    pub number: TableNumber,
    /// Human-readable label shown by the presentation layer.
    pub label: String,
}

impl Order {
    /// Construct an order with the provided table number and label.
    pub fn new(number: TableNumber, label: impl Into<String>) -> Self {
        Self {
            number,
            label: label.into(),
        }
    }
}

impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
    }
}

impl Eq for Order {}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// How a session executes its orders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ExecutionMode {
    /// One cook, run on the presentation context itself.
    Sequential,
    /// A fixed roster of cooks fed from the shared queue.
    Concurrent,
}

impl ExecutionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionMode::Sequential => "sequential",
            ExecutionMode::Concurrent => "concurrent",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
