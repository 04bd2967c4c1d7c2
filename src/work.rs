//! Simulated work unit: a timed, progress-reporting stand-in for cooking a dish.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SessionConfig;
use crate::error::WorkError;
use crate::events::{EventSink, KitchenEvent};
use crate::types::{Order, SlotId};

/// Jitter added to the base duration, in time units: `[0.5, 1.5)`.
pub const JITTER_MIN: f64 = 0.5;
pub const JITTER_MAX: f64 = 1.5;

/// Something that can turn one order into a finished dish.
///
/// Implementations emit `Started`, `Progress` and `Completed` for the order and
/// return the measured elapsed time. An `Err` is fatal to this order only.
pub trait OrderProcessor: Send + Sync {
    fn process(
        &self,
        slot: SlotId,
        order: &Order,
        sink: &dyn EventSink,
    ) -> Result<Duration, WorkError>;
}

/// Run one order through `processor`, turning a panic into a [`WorkError`].
pub(crate) fn run_guarded(
    processor: &dyn OrderProcessor,
    slot: SlotId,
    order: &Order,
    sink: &dyn EventSink,
) -> Result<Duration, WorkError> {
    panic::catch_unwind(AssertUnwindSafe(|| processor.process(slot, order, sink)))
        .unwrap_or_else(|payload| Err(WorkError::new(order, panic_reason(payload.as_ref()))))
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("work unit panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("work unit panicked: {message}")
    } else {
        "work unit panicked".to_string()
    }
}

/// Sleeps for `base + jitter` time units, reporting progress along the way.
#[derive(Clone, Debug)]
pub struct SimulatedCook {
    base_duration: f64,
    time_unit: Duration,
    steps: u32,
    seed: Option<u64>,
}

impl SimulatedCook {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            base_duration: config.base_duration,
            time_unit: config.time_unit,
            steps: config.progress_steps.max(1),
            seed: config.seed,
        }
    }

    /// Jitter for `order`. Seeded cooks derive it from the table number so that
    /// every mode cooks the same order for the same time.
    fn jitter(&self, order: &Order) -> f64 {
        match self.seed {
            Some(seed) => {
                let mixed = seed ^ u64::from(order.number).wrapping_mul(0x9E37_79B9_7F4A_7C15);
                StdRng::seed_from_u64(mixed).random_range(JITTER_MIN..JITTER_MAX)
            }
            None => rand::rng().random_range(JITTER_MIN..JITTER_MAX),
        }
    }

    /// Nominal wall-clock duration for cooking `order`.
    pub fn nominal_duration(&self, order: &Order) -> Duration {
        self.time_unit.mul_f64(self.base_duration + self.jitter(order))
    }
}

impl OrderProcessor for SimulatedCook {
    fn process(
        &self,
        slot: SlotId,
        order: &Order,
        sink: &dyn EventSink,
    ) -> Result<Duration, WorkError> {
        let nominal = self.nominal_duration(order);
        let start = Instant::now();
        sink.emit(KitchenEvent::Started {
            slot,
            order: order.clone(),
        });

        for step in 0..=self.steps {
            // Sleep to a deadline so per-step overhead does not accumulate.
            let deadline = start + nominal.mul_f64(f64::from(step) / f64::from(self.steps));
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            }
            let percent = (u64::from(step) * 100 / u64::from(self.steps)) as u8;
            sink.emit(KitchenEvent::Progress {
                slot,
                order: order.clone(),
                percent,
            });
        }

        let elapsed = start.elapsed();
        sink.emit(KitchenEvent::Completed {
            slot,
            order: order.clone(),
            elapsed,
        });
        Ok(elapsed)
    }
}
