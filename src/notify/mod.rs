//! Alert dispatch module
//!
//! Delivers alert cards to a webhook through a bounded queue and a worker
//! pool. Producers never block: a full queue rejects the alert.

mod backoff;
mod dispatcher;
mod error;

pub use backoff::{jitter, RetryPolicy};
pub use dispatcher::Notifier;
pub use error::NotifyError;

use crate::alert::AlertEvent;

/// Destination for raised alerts
pub trait AlertSink: Send + Sync {
    /// Hand off an alert without blocking
    fn send(&self, alert: AlertEvent) -> Result<(), NotifyError>;
}

/// Sink that only logs, used when webhook delivery is disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn send(&self, alert: AlertEvent) -> Result<(), NotifyError> {
        tracing::debug!(alert_id = %alert.alert_id(), "Webhook disabled, alert not delivered");
        Ok(())
    }
}
