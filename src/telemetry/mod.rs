//! Telemetry module
//!
//! Structured logging and Prometheus counters

mod logging;
mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{incr_counter, init_metrics, record_alert, CounterMetric};

use crate::config::TelemetryConfig;

/// Initialize all telemetry subsystems
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<()> {
    init_logging(&config.log_level, config.log_format)?;

    if let Some(port) = config.metrics_port {
        init_metrics(port)?;
    }

    Ok(())
}
