//! Exponential moving average with a slope estimate

use super::RollingWindow;

/// Smoothing factor used when a configured alpha is outside (0, 1]
pub const DEFAULT_ALPHA: f64 = 0.2;

/// Number of past EMA values kept for slope estimation by default
pub const DEFAULT_SLOPE_HISTORY: usize = 12;

/// Exponential moving average
///
/// The first update seeds the average directly; later updates blend
/// `alpha * input + (1 - alpha) * value`. Past EMA values are retained so
/// that [`Ema::slope`] can report the average change per update over a
/// lookback of several periods.
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f64,
    value: Option<f64>,
    previous: Option<f64>,
    history: RollingWindow<f64>,
}

impl Ema {
    /// Create an EMA with the given smoothing factor
    pub fn new(alpha: f64) -> Self {
        Self::with_history(alpha, DEFAULT_SLOPE_HISTORY)
    }

    /// Create an EMA able to report slopes over up to `periods` updates
    pub fn with_history(alpha: f64, periods: usize) -> Self {
        let alpha = if alpha > 0.0 && alpha <= 1.0 {
            alpha
        } else {
            DEFAULT_ALPHA
        };
        Self {
            alpha,
            value: None,
            previous: None,
            history: RollingWindow::new(periods.saturating_add(1)),
        }
    }

    /// Create an EMA with alpha = 2 / (period + 1)
    pub fn from_period(period: usize) -> Self {
        let period = if period == 0 { 10 } else { period };
        Self::new(2.0 / (period as f64 + 1.0))
    }

    /// Feed a new observation
    pub fn update(&mut self, input: f64) {
        let next = match self.value {
            Some(current) => self.alpha * input + (1.0 - self.alpha) * current,
            None => input,
        };
        self.previous = self.value;
        self.value = Some(next);
        self.history.push(next);
    }

    /// Current average, `None` until the first update
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Average before the most recent update
    pub fn previous(&self) -> Option<f64> {
        self.previous
    }

    /// Average change per update over the last `periods` updates
    ///
    /// Computed as `(value_now - value_{periods ago}) / periods`. Returns 0
    /// until `periods + 1` values have been observed, and always 0 when
    /// `periods` is 0 or exceeds the retained history.
    pub fn slope(&self, periods: usize) -> f64 {
        let len = self.history.size();
        if periods == 0 || len <= periods {
            return 0.0;
        }
        let (Some(latest), Some(past)) = (
            self.history.iter().nth(len - 1),
            self.history.iter().nth(len - 1 - periods),
        ) else {
            return 0.0;
        };
        (latest - past) / periods as f64
    }

    /// Return to the uninitialized state
    pub fn reset(&mut self) {
        self.value = None;
        self.previous = None;
        self.history.clear();
    }

    pub fn is_initialized(&self) -> bool {
        self.value.is_some()
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}
