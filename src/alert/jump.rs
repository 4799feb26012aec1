//! Price jump detection
//!
//! Flags a tick whose price change lies far outside the distribution of
//! recent price changes:
//!
//! `z = |Δp_latest - mean(Δp)| / stddev(Δp)`

use super::{AlertEvent, AlertKind, Detector, DetectorInput, Severity};
use crate::analytics::{mean, stddev};
use crate::config::JumpConfig;
use parking_lot::Mutex;

/// Z-score jump detector over the price-change window
pub struct JumpDetector {
    config: JumpConfig,
    /// Serializes evaluations
    lock: Mutex<()>,
}

impl JumpDetector {
    pub fn new(config: JumpConfig) -> Self {
        Self {
            config,
            lock: Mutex::new(()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(JumpConfig::default())
    }

    /// Latest change and its z-score, if the window is above the noise floor
    fn z_score(&self, values: &[f64]) -> Option<(f64, f64)> {
        let latest = *values.last()?;
        let std = stddev(values);
        if std < self.config.noise_floor {
            return None;
        }
        let z = (latest - mean(values)).abs() / std;
        Some((latest, z))
    }
}

impl Detector for JumpDetector {
    fn name(&self) -> &'static str {
        "jump"
    }

    fn evaluate(&self, input: &DetectorInput<'_>) -> Option<AlertEvent> {
        let _guard = self.lock.lock();

        let values = input.price_changes();
        let (latest, z) = self.z_score(&values)?;

        tracing::debug!(
            detector = "jump",
            std = stddev(&values),
            z,
            "Evaluated jump"
        );

        if z < self.config.z_threshold {
            return None;
        }

        Some(AlertEvent::new(
            AlertKind::Jump,
            Severity::Critical,
            input.symbol,
            format!("price jump detected: Δp={:.2}, z={:.2}", latest, z),
            input.now,
        ))
    }
}
