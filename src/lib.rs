//! tick-sentinel: real-time market data alerting
//!
//! This library provides the core components for:
//! - Snapshot ingestion and per-tick derivation
//! - Rolling windows, EMAs and summary statistics
//! - Jump, trend, volatility and feed-health detectors
//! - Webhook delivery with a bounded queue, worker pool and retries
//! - Structured logging and Prometheus counters

pub mod alert;
pub mod analytics;
pub mod cli;
pub mod config;
pub mod feed;
pub mod monitor;
pub mod notify;
pub mod telemetry;
