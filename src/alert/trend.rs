//! Sustained trend detection
//!
//! Tracks a fast and a slow EMA of the price. A tick qualifies when the EMA
//! spread and the fast EMA slope are both large enough and point the same
//! way; a run of consecutive qualifying ticks raises an alert.

use super::{AlertEvent, AlertKind, Detector, DetectorInput, Severity};
use crate::analytics::Ema;
use crate::config::TrendConfig;
use parking_lot::Mutex;

#[derive(Debug)]
struct TrendState {
    fast: Ema,
    slow: Ema,
    consecutive: u32,
}

impl TrendState {
    fn new(config: &TrendConfig) -> Self {
        Self {
            fast: Ema::with_history(config.fast_alpha, config.slope_lookback),
            slow: Ema::new(config.slow_alpha),
            consecutive: 0,
        }
    }

    /// Feed a price; returns (fast - slow, fast slope)
    fn update(&mut self, price: f64, lookback: usize) -> (f64, f64) {
        self.fast.update(price);
        self.slow.update(price);
        let fast = self.fast.value().unwrap_or_default();
        let slow = self.slow.value().unwrap_or_default();
        (fast - slow, self.fast.slope(lookback))
    }

    /// Advance the consecutive counter; true when a run completes (counter resets)
    fn register(&mut self, diff: f64, slope: f64, config: &TrendConfig) -> bool {
        let same_direction = (diff > 0.0 && slope > 0.0) || (diff < 0.0 && slope < 0.0);

        if diff.abs() >= config.min_diff && slope.abs() >= config.min_slope && same_direction {
            self.consecutive += 1;
        } else {
            self.consecutive = 0;
        }

        if self.consecutive >= config.consecutive.max(1) {
            self.consecutive = 0;
            return true;
        }
        false
    }
}

/// EMA crossover trend detector
pub struct TrendDetector {
    config: TrendConfig,
    state: Mutex<TrendState>,
}

impl TrendDetector {
    pub fn new(config: TrendConfig) -> Self {
        let state = Mutex::new(TrendState::new(&config));
        Self { config, state }
    }

    pub fn with_defaults() -> Self {
        Self::new(TrendConfig::default())
    }

    /// Current consecutive qualifying count
    pub fn consecutive(&self) -> u32 {
        self.state.lock().consecutive
    }
}

impl Detector for TrendDetector {
    fn name(&self) -> &'static str {
        "trend"
    }

    fn evaluate(&self, input: &DetectorInput<'_>) -> Option<AlertEvent> {
        let mut state = self.state.lock();

        let (diff, slope) = state.update(input.snapshot.last_price, self.config.slope_lookback);

        tracing::debug!(
            detector = "trend",
            fast = state.fast.value().unwrap_or_default(),
            slow = state.slow.value().unwrap_or_default(),
            slope,
            "Evaluated trend"
        );

        if !state.register(diff, slope, &self.config) {
            return None;
        }

        let direction = if slope > 0.0 { "up" } else { "down" };
        Some(AlertEvent::new(
            AlertKind::Trend,
            Severity::Info,
            input.symbol,
            format!(
                "trend {} detected, slope={:.4}/tick, ema_diff={:.2}",
                direction, slope, diff
            ),
            input.now,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{change_window, input, snapshot};
    use super::*;

    fn run_prices(detector: &TrendDetector, prices: impl IntoIterator<Item = f64>) -> Vec<(usize, AlertEvent)> {
        let window = change_window(&[]);
        prices
            .into_iter()
            .enumerate()
            .filter_map(|(i, p)| {
                let snap = snapshot(p);
                detector.evaluate(&input(&snap, &window)).map(|a| (i, a))
            })
            .collect()
    }

    #[test]
    fn test_five_consecutive_fire_once_then_reset() {
        let config = TrendConfig::default();
        let mut state = TrendState::new(&config);

        for _ in 0..4 {
            assert!(!state.register(5.0, 0.5, &config));
        }
        assert!(state.register(5.0, 0.5, &config));
        assert_eq!(state.consecutive, 0);

        // A new run has to accumulate again
        for _ in 0..4 {
            assert!(!state.register(5.0, 0.5, &config));
        }
        assert!(state.register(5.0, 0.5, &config));
    }

    #[test]
    fn test_direction_flip_resets() {
        let config = TrendConfig::default();
        let mut state = TrendState::new(&config);

        for _ in 0..4 {
            assert!(!state.register(5.0, 0.5, &config));
        }
        // spread still up, slope turned down
        assert!(!state.register(5.0, -0.5, &config));
        assert_eq!(state.consecutive, 0);

        for _ in 0..4 {
            assert!(!state.register(5.0, 0.5, &config));
        }
        assert!(state.register(5.0, 0.5, &config));
    }

    #[test]
    fn test_thresholds_reset() {
        let config = TrendConfig::default();
        let mut state = TrendState::new(&config);

        state.register(5.0, 0.5, &config);
        state.register(2.9, 0.5, &config); // diff too small
        assert_eq!(state.consecutive, 0);

        state.register(5.0, 0.5, &config);
        state.register(5.0, 0.001, &config); // slope too small
        assert_eq!(state.consecutive, 0);

        state.register(-5.0, -0.5, &config);
        assert_eq!(state.consecutive, 1);
        state.register(0.0, 0.0, &config);
        assert_eq!(state.consecutive, 0);
    }

    #[test]
    fn test_up_ramp_alerts_every_five_ticks() {
        let detector = TrendDetector::with_defaults();
        let alerts = run_prices(&detector, (0..40).map(|i| 2000.0 + i as f64));

        let ticks: Vec<usize> = alerts.iter().map(|(i, _)| *i).collect();
        assert_eq!(ticks, vec![16, 21, 26, 31, 36]);

        let (_, first) = &alerts[0];
        assert_eq!(first.kind, AlertKind::Trend);
        assert_eq!(first.severity, Severity::Info);
        assert!(first.message.starts_with("trend up detected"), "{}", first.message);
    }

    #[test]
    fn test_down_ramp() {
        let detector = TrendDetector::with_defaults();
        let alerts = run_prices(&detector, (0..20).map(|i| 2000.0 - i as f64));

        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].1.message.starts_with("trend down detected"));
    }

    #[test]
    fn test_flat_price_never_alerts() {
        let detector = TrendDetector::with_defaults();
        assert!(run_prices(&detector, std::iter::repeat(2000.0).take(100)).is_empty());
        assert_eq!(detector.consecutive(), 0);
    }

    #[test]
    fn test_no_slope_before_lookback() {
        // The slope needs lookback + 1 updates, so nothing can qualify earlier
        let detector = TrendDetector::with_defaults();
        let alerts = run_prices(&detector, (0..12).map(|i| 2000.0 + 10.0 * i as f64));
        assert!(alerts.is_empty());
        assert_eq!(detector.consecutive(), 0);
    }
}
