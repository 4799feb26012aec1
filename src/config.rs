//! Configuration types for tick-sentinel

use crate::telemetry::LogFormat;
use serde::Deserialize;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub feed: FeedConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub detectors: DetectorsConfig,
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Snapshot feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Symbol monitored by this process
    pub symbol: String,

    /// Capacity of the snapshot channel between feed and monitor
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer: usize,

    /// Secondary display price for logs, e.g. USD/oz quoted as CNY/g
    #[serde(default)]
    pub display: Option<DisplayConfig>,
}

fn default_channel_buffer() -> usize {
    100
}

/// Conversion of the quoted price into a local display unit
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Quote currency to display currency
    pub fx_rate: f64,
    /// Quote units per display unit (31.1035 grams per troy ounce)
    pub unit_divisor: f64,
    /// Label appended in logs
    pub unit: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fx_rate: 6.92,
            unit_divisor: 31.1035,
            unit: "CNY/g".to_string(),
        }
    }
}

impl DisplayConfig {
    /// Convert a quoted price into the display unit
    pub fn convert(&self, price: f64) -> f64 {
        price * self.fx_rate / self.unit_divisor
    }
}

/// Orchestrator configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Capacity of the snapshot and price-change windows
    pub window_size: usize,

    /// Minimum spacing between processed snapshots (seconds)
    pub push_interval_secs: u64,

    /// Detectors run once the change window holds more than this many entries
    pub warmup_changes: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window_size: 7200,
            push_interval_secs: 12, // one evaluation per 12s
            warmup_changes: 2,
        }
    }
}

impl MonitorConfig {
    pub fn push_interval(&self) -> Duration {
        Duration::from_secs(self.push_interval_secs)
    }
}

/// Thresholds for every detector
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DetectorsConfig {
    pub jump: JumpConfig,
    pub trend: TrendConfig,
    pub volatility: VolatilityConfig,
    pub health: HealthConfig,
}

/// Jump (z-score spike) detector configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JumpConfig {
    pub enabled: bool,

    /// Below this price-change stddev the window is treated as noise
    pub noise_floor: f64,

    /// Minimum z-score of the latest price change to alert
    pub z_threshold: f64,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            noise_floor: 0.2,
            z_threshold: 4.0,
        }
    }
}

/// Trend (EMA crossover) detector configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub enabled: bool,

    /// Smoothing factor of the reactive EMA
    pub fast_alpha: f64,

    /// Smoothing factor of the smooth EMA
    pub slow_alpha: f64,

    /// Number of updates the fast EMA slope is measured over
    pub slope_lookback: usize,

    /// Minimum |fast - slow|
    pub min_diff: f64,

    /// Minimum |slope| (price units per evaluation)
    pub min_slope: f64,

    /// Consecutive qualifying evaluations before alerting
    pub consecutive: u32,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fast_alpha: 0.2,
            slow_alpha: 0.05,
            slope_lookback: 12,
            min_diff: 3.0,
            min_slope: 0.0025,
            consecutive: 5, // ~1 minute at a 12s cadence
        }
    }
}

/// Volatility (short/long stddev ratio) detector configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VolatilityConfig {
    pub enabled: bool,

    /// Samples in the short-horizon window
    pub short_window: usize,

    /// Samples in the long-horizon window; also the minimum history required
    pub long_window: usize,

    /// Below this long-horizon stddev the baseline is treated as noise
    pub noise_floor: f64,

    /// Minimum short/long stddev ratio
    pub ratio_threshold: f64,

    /// Consecutive qualifying evaluations before alerting
    pub consecutive: u32,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            short_window: 50,
            long_window: 300,
            noise_floor: 0.2,
            ratio_threshold: 2.5,
            consecutive: 3,
        }
    }
}

/// Feed health detector configuration (0 disables a check)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub enabled: bool,
    pub max_unchanged_price: u32,
    pub max_unchanged_volume: u32,
    pub max_unchanged_turnover: u32,
    pub timestamp_tolerance_secs: u64,
    pub check_suspended: bool,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_unchanged_price: 0,
            max_unchanged_volume: 0,
            max_unchanged_turnover: 0,
            timestamp_tolerance_secs: 0,
            check_suspended: true,
        }
    }
}

/// Webhook dispatcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub webhook_url: String,

    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    /// Upper bound on any retry delay before jitter (milliseconds)
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Capacity of the alert queue
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,

    /// Number of delivery workers
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_true() -> bool {
    true
}
fn default_max_retries() -> u32 {
    3
}
fn default_base_backoff_ms() -> u64 {
    1000
}
fn default_max_backoff_ms() -> u64 {
    30_000
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_queue_size() -> usize {
    100
}
fn default_workers() -> usize {
    2
}

impl NotifierConfig {
    /// Config with defaults for everything but the target URL
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            enabled: true,
            webhook_url: webhook_url.into(),
            max_retries: default_max_retries(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            timeout_secs: default_timeout_secs(),
            queue_size: default_queue_size(),
            workers: default_workers(),
        }
    }

    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
    /// Serve Prometheus metrics on this port when set
    pub metrics_port: Option<u16>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reject configurations the monitor cannot start with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.feed.symbol.trim().is_empty() {
            anyhow::bail!("feed.symbol is required");
        }
        if self.monitor.window_size == 0 {
            anyhow::bail!("monitor.window_size must be at least 1");
        }

        if let Some(display) = &self.feed.display {
            if !(display.fx_rate > 0.0 && display.unit_divisor > 0.0) {
                anyhow::bail!("feed.display.fx_rate and feed.display.unit_divisor must be positive");
            }
        }

        let trend = &self.detectors.trend;
        if trend.enabled
            && (trend.slope_lookback == 0 || trend.slope_lookback > self.monitor.window_size)
        {
            anyhow::bail!(
                "detectors.trend.slope_lookback must be in 1..={}",
                self.monitor.window_size
            );
        }

        let vol = &self.detectors.volatility;
        if vol.enabled {
            if vol.short_window == 0 || vol.short_window > vol.long_window {
                anyhow::bail!(
                    "detectors.volatility.short_window must be in 1..={}",
                    vol.long_window
                );
            }
            if vol.long_window > self.monitor.window_size {
                anyhow::bail!(
                    "detectors.volatility.long_window ({}) exceeds monitor.window_size ({})",
                    vol.long_window,
                    self.monitor.window_size
                );
            }
        }

        let notifier = &self.notifier;
        if notifier.enabled {
            if notifier.webhook_url.trim().is_empty() {
                anyhow::bail!("notifier.webhook_url is required when the notifier is enabled");
            }
            if notifier.queue_size == 0 || notifier.workers == 0 {
                anyhow::bail!("notifier.queue_size and notifier.workers must be at least 1");
            }
        }

        Ok(())
    }
}
