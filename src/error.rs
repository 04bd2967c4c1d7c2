//! Error types for configuration, dispatch, and work units.

use crate::types::Order;

/// The queue had nothing left to hand out.
///
/// Internal signal telling a slot to stop asking for work; never shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("order queue is empty")]
pub struct EmptyQueue;

/// Errors surfaced to whoever starts a session.
#[derive(Debug, thiserror::Error)]
pub enum KitchenError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("failed to spawn cook thread: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("console output failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("cook thread panicked outside of a work unit")]
    SessionPanicked,
}

/// A single work unit failed. Fatal to that order only.
#[derive(Debug, Clone, thiserror::Error)]
#[error("order '{order}' failed: {reason}")]
pub struct WorkError {
    pub order: Order,
    pub reason: String,
}

impl WorkError {
    pub fn new(order: &Order, reason: impl Into<String>) -> Self {
        Self {
            order: order.clone(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, KitchenError>;
