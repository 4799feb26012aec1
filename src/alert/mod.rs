//! Alert detection module
//!
//! Statistical detectors evaluated once per admitted snapshot. Each detector
//! owns its state behind a lock so `evaluate` can take `&self` and stay safe
//! if snapshots ever arrive from more than one source.

mod card;
mod health;
mod jump;
mod trend;
mod types;
mod volatility;

pub use card::CardMessage;
pub use health::HealthDetector;
pub use jump::JumpDetector;
pub use trend::TrendDetector;
pub use types::{AlertEvent, AlertKind, Severity};
pub use volatility::VolatilityDetector;

use crate::analytics::RollingWindow;
use crate::config::DetectorsConfig;
use crate::feed::{DerivedTick, Snapshot};
use chrono::{DateTime, Utc};

/// Everything a detector may look at for one evaluation
#[derive(Debug, Clone, Copy)]
pub struct DetectorInput<'a> {
    /// Symbol alerts are attributed to
    pub symbol: &'a str,
    /// Snapshot that triggered this evaluation
    pub snapshot: &'a Snapshot,
    /// Price-change history, oldest to newest, including the latest tick
    pub changes: &'a RollingWindow<DerivedTick>,
    /// Evaluation time, used as the alert timestamp
    pub now: DateTime<Utc>,
}

impl DetectorInput<'_> {
    /// Price changes in window order
    pub fn price_changes(&self) -> Vec<f64> {
        self.changes.iter().map(|t| t.price_change).collect()
    }
}

/// A stateful alert rule
pub trait Detector: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Evaluate one tick, returning at most one alert
    fn evaluate(&self, input: &DetectorInput<'_>) -> Option<AlertEvent>;
}

/// Build the enabled detectors in evaluation order
pub fn build_detectors(config: &DetectorsConfig) -> Vec<Box<dyn Detector>> {
    let mut detectors: Vec<Box<dyn Detector>> = Vec::new();
    if config.jump.enabled {
        detectors.push(Box::new(JumpDetector::new(config.jump.clone())));
    }
    if config.trend.enabled {
        detectors.push(Box::new(TrendDetector::new(config.trend.clone())));
    }
    if config.volatility.enabled {
        detectors.push(Box::new(VolatilityDetector::new(config.volatility.clone())));
    }
    if config.health.enabled {
        detectors.push(Box::new(HealthDetector::new(config.health.clone())));
    }
    detectors
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::feed::SnapshotStatus;
    use chrono::TimeZone;

    pub fn ts() -> DateTime<Utc> {
        Utc.timestamp_opt(1_704_067_200, 0).unwrap()
    }

    pub fn snapshot(price: f64) -> Snapshot {
        Snapshot {
            symbol: "XAUUSD".to_string(),
            last_price: price,
            open: price,
            high: price,
            low: price,
            volume: 0.0,
            turnover: 0.0,
            timestamp: ts(),
            status: SnapshotStatus::Normal,
        }
    }

    pub fn change_window(changes: &[f64]) -> RollingWindow<DerivedTick> {
        let mut window = RollingWindow::new(changes.len().max(1));
        for &c in changes {
            window.push(DerivedTick::from_price_change(c));
        }
        window
    }

    pub fn input<'a>(
        snapshot: &'a Snapshot,
        changes: &'a RollingWindow<DerivedTick>,
    ) -> DetectorInput<'a> {
        DetectorInput {
            symbol: "XAUUSD",
            snapshot,
            changes,
            now: ts(),
        }
    }
}
