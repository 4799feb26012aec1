//! Volatility spike detection
//!
//! Compares the stddev of the most recent price changes against a longer
//! baseline. With the defaults that is the last 50 ticks against the last
//! 300, i.e. 10 minutes against an hour at a 12s cadence.

use super::{AlertEvent, AlertKind, Detector, DetectorInput, Severity};
use crate::analytics::stddev;
use crate::config::VolatilityConfig;
use parking_lot::Mutex;

/// Short/long stddev ratio detector
pub struct VolatilityDetector {
    config: VolatilityConfig,
    consecutive: Mutex<u32>,
}

impl VolatilityDetector {
    pub fn new(config: VolatilityConfig) -> Self {
        Self {
            config,
            consecutive: Mutex::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(VolatilityConfig::default())
    }

    /// Current consecutive qualifying count
    pub fn consecutive(&self) -> u32 {
        *self.consecutive.lock()
    }
}

impl Detector for VolatilityDetector {
    fn name(&self) -> &'static str {
        "volatility"
    }

    fn evaluate(&self, input: &DetectorInput<'_>) -> Option<AlertEvent> {
        let mut consecutive = self.consecutive.lock();

        if input.changes.size() < self.config.long_window {
            return None;
        }

        let changes: Vec<f64> = input
            .changes
            .tail(self.config.long_window)
            .iter()
            .map(|t| t.price_change)
            .collect();
        let short_start = changes.len().saturating_sub(self.config.short_window);

        let short_std = stddev(&changes[short_start..]);
        let long_std = stddev(&changes);

        if long_std < self.config.noise_floor {
            return None;
        }

        let ratio = short_std / long_std;
        if ratio >= self.config.ratio_threshold {
            *consecutive += 1;
        } else {
            *consecutive = 0;
        }

        tracing::debug!(
            detector = "volatility",
            short_std,
            long_std,
            ratio,
            consecutive = *consecutive,
            "Evaluated volatility"
        );

        if *consecutive < self.config.consecutive.max(1) {
            return None;
        }
        *consecutive = 0;

        Some(AlertEvent::new(
            AlertKind::Volatility,
            Severity::Warning,
            input.symbol,
            format!("volatility increased: ratio={:.2}", ratio),
            input.now,
        ))
    }
}
