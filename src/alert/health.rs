//! Feed health detection
//!
//! Watches for a stale or stalled feed: fields that stop changing, exchange
//! timestamps falling behind, and trading suspensions. Each condition
//! alerts once when it starts and re-arms when it clears.

use super::{AlertEvent, AlertKind, Detector, DetectorInput, Severity};
use crate::config::HealthConfig;
use parking_lot::Mutex;

/// Consecutive-unchanged tracker for a single field
#[derive(Debug, Default)]
struct Streak {
    last: Option<f64>,
    unchanged: u32,
}

impl Streak {
    /// Record a value; true exactly when the streak reaches `limit`
    fn observe(&mut self, value: f64, limit: u32) -> bool {
        if self.last == Some(value) {
            self.unchanged += 1;
        } else {
            self.unchanged = 0;
        }
        self.last = Some(value);
        limit > 0 && self.unchanged == limit
    }
}

#[derive(Debug, Default)]
struct HealthState {
    price: Streak,
    volume: Streak,
    turnover: Streak,
    lagging: bool,
    suspended: bool,
}

/// Stale-feed detector
pub struct HealthDetector {
    config: HealthConfig,
    state: Mutex<HealthState>,
}

impl HealthDetector {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            config,
            state: Mutex::new(HealthState::default()),
        }
    }

    fn problems(&self, state: &mut HealthState, input: &DetectorInput<'_>) -> Vec<String> {
        let snap = input.snapshot;
        let mut problems = Vec::new();

        if self.config.check_suspended {
            let suspended = snap.is_suspended();
            if suspended && !state.suspended {
                problems.push("trading suspended".to_string());
            }
            state.suspended = suspended;
        }

        if self.config.timestamp_tolerance_secs > 0 {
            let lag = (input.now - snap.timestamp).num_seconds();
            let lagging = lag > self.config.timestamp_tolerance_secs as i64;
            if lagging && !state.lagging {
                problems.push(format!("feed lagging by {}s", lag));
            }
            state.lagging = lagging;
        }

        let limit = self.config.max_unchanged_price;
        if state.price.observe(snap.last_price, limit) {
            problems.push(format!("price unchanged for {} ticks", limit));
        }
        let limit = self.config.max_unchanged_volume;
        if state.volume.observe(snap.volume, limit) {
            problems.push(format!("volume unchanged for {} ticks", limit));
        }
        let limit = self.config.max_unchanged_turnover;
        if state.turnover.observe(snap.turnover, limit) {
            problems.push(format!("turnover unchanged for {} ticks", limit));
        }

        problems
    }
}

impl Detector for HealthDetector {
    fn name(&self) -> &'static str {
        "health"
    }

    fn evaluate(&self, input: &DetectorInput<'_>) -> Option<AlertEvent> {
        let mut state = self.state.lock();
        let problems = self.problems(&mut state, input);

        if problems.is_empty() {
            return None;
        }

        Some(AlertEvent::new(
            AlertKind::Health,
            Severity::Warning,
            input.symbol,
            format!("feed health degraded: {}", problems.join("; ")),
            input.now,
        ))
    }
}
