//! CLI interface for tick-sentinel
//!
//! Provides subcommands for:
//! - `run`: Replay snapshots through the monitor and deliver alerts
//! - `check`: Validate the configuration and exit
//! - `config`: Show the effective configuration

mod run;

pub use run::RunArgs;

use crate::config::Config;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tick-sentinel")]
#[command(about = "Real-time market data alerting with webhook delivery")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the monitor over a snapshot stream
    Run(RunArgs),
    /// Validate the configuration and exit
    Check,
    /// Show the effective configuration
    Config,
}

/// Human-readable configuration summary
pub fn config_summary(config: &Config) -> String {
    let d = &config.detectors;
    let n = &config.notifier;
    let mut lines = vec![
        "Current configuration:".to_string(),
        format!(
            "  Feed: {} (buffer {})",
            config.feed.symbol, config.feed.channel_buffer
        ),
        format!(
            "  Monitor: window={}, push_interval={}s, warmup={}",
            config.monitor.window_size,
            config.monitor.push_interval_secs,
            config.monitor.warmup_changes
        ),
        format!(
            "  Jump: enabled={}, z>={}, floor={}",
            d.jump.enabled, d.jump.z_threshold, d.jump.noise_floor
        ),
        format!(
            "  Trend: enabled={}, alphas={}/{}, lookback={}, consecutive={}",
            d.trend.enabled,
            d.trend.fast_alpha,
            d.trend.slow_alpha,
            d.trend.slope_lookback,
            d.trend.consecutive
        ),
        format!(
            "  Volatility: enabled={}, windows={}/{}, ratio>={}, consecutive={}",
            d.volatility.enabled,
            d.volatility.short_window,
            d.volatility.long_window,
            d.volatility.ratio_threshold,
            d.volatility.consecutive
        ),
        format!("  Health: enabled={}", d.health.enabled),
    ];

    if n.enabled {
        lines.push(format!(
            "  Notifier: workers={}, queue={}, retries={}, backoff={}..{}ms",
            n.workers, n.queue_size, n.max_retries, n.base_backoff_ms, n.max_backoff_ms
        ));
    } else {
        lines.push("  Notifier: disabled (alerts are logged only)".to_string());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_args() {
        let cli = Cli::parse_from([
            "tick-sentinel",
            "-c",
            "custom.toml",
            "run",
            "--input",
            "ticks.jsonl",
            "--pace-ms",
            "50",
        ]);
        assert_eq!(cli.config, "custom.toml");
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.input.unwrap().to_str(), Some("ticks.jsonl"));
                assert_eq!(args.pace_ms, 50);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::parse_from(["tick-sentinel", "check"]);
        assert_eq!(cli.config, "config.toml");
        assert!(matches!(cli.command, Commands::Check));
    }

    #[test]
    fn test_config_summary() {
        let config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();
        let summary = config_summary(&config);
        assert!(summary.contains("Feed: XAUUSD"));
        assert!(summary.contains("Trend: enabled=true"));
    }
}
