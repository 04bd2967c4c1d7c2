//! Session configuration and its bounds.

use std::time::Duration;

use crate::error::{KitchenError, Result};

pub const DEFAULT_ORDER_COUNT: usize = 10;
pub const DEFAULT_BASE_DURATION: f64 = 2.0;
pub const DEFAULT_COOKS: usize = 3;
pub const DEFAULT_PROGRESS_STEPS: u32 = 100;

pub const MIN_ORDER_COUNT: usize = 1;
pub const MAX_ORDER_COUNT: usize = 50;
pub const MIN_BASE_DURATION: f64 = 1.0;
pub const MAX_BASE_DURATION: f64 = 5.0;
pub const MAX_COOKS: usize = 16;

/// Settings captured when a session starts; a session never sees later edits.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    /// Number of orders generated for the session.
    pub order_count: usize,
    /// Base preparation time per order, in time units.
    pub base_duration: f64,
    /// Number of worker slots used by the concurrent mode.
    pub cooks: usize,
    /// Wall-clock length of one time unit.
    pub time_unit: Duration,
    /// Progress events per order (excluding the initial 0%).
    pub progress_steps: u32,
    /// Seed for reproducible jitter and menu choices.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            order_count: DEFAULT_ORDER_COUNT,
            base_duration: DEFAULT_BASE_DURATION,
            cooks: DEFAULT_COOKS,
            time_unit: Duration::from_secs(1),
            progress_steps: DEFAULT_PROGRESS_STEPS,
            seed: None,
        }
    }
}

impl SessionConfig {
    /// Reject configurations a session cannot start with.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_ORDER_COUNT..=MAX_ORDER_COUNT).contains(&self.order_count) {
            return Err(KitchenError::InvalidConfiguration(format!(
                "order_count must be in {MIN_ORDER_COUNT}..={MAX_ORDER_COUNT}, got {}",
                self.order_count
            )));
        }
        // NaN fails the range check as well.
        if !(MIN_BASE_DURATION..=MAX_BASE_DURATION).contains(&self.base_duration) {
            return Err(KitchenError::InvalidConfiguration(format!(
                "base_duration must be in {MIN_BASE_DURATION}..={MAX_BASE_DURATION}, got {}",
                self.base_duration
            )));
        }
        if self.cooks == 0 || self.cooks > MAX_COOKS {
            return Err(KitchenError::InvalidConfiguration(format!(
                "cooks must be in 1..={MAX_COOKS}, got {}",
                self.cooks
            )));
        }
        if self.time_unit.is_zero() {
            return Err(KitchenError::InvalidConfiguration(
                "time_unit must be > 0".to_string(),
            ));
        }
        if self.progress_steps == 0 {
            return Err(KitchenError::InvalidConfiguration(
                "progress_steps must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Same settings with a different time unit; handy for fast demos and tests.
    pub fn with_time_unit(mut self, time_unit: Duration) -> Self {
        self.time_unit = time_unit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_orders() {
        let config = SessionConfig {
            order_count: 0,
            ..SessionConfig::default()
        };
        let err = config.validate().expect_err("zero orders accepted");
        assert!(matches!(err, KitchenError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("order_count"));
    }

    #[test]
    fn rejects_out_of_range_duration() {
        for base_duration in [0.0, -1.0, 5.5, f64::NAN] {
            let config = SessionConfig {
                base_duration,
                ..SessionConfig::default()
            };
            assert!(
                config.validate().is_err(),
                "base_duration {base_duration} accepted"
            );
        }
    }

    #[test]
    fn rejects_zero_cooks_and_zero_time_unit() {
        let no_cooks = SessionConfig {
            cooks: 0,
            ..SessionConfig::default()
        };
        assert!(no_cooks.validate().is_err());

        let frozen = SessionConfig::default().with_time_unit(Duration::ZERO);
        assert!(frozen.validate().is_err());
    }
}
