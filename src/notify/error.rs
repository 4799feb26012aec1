//! Dispatcher errors

use thiserror::Error;

/// Errors raised by the alert dispatcher
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook URL is empty")]
    EmptyWebhookUrl,

    #[error("alert queue is full")]
    QueueFull,

    #[error("notifier is closed")]
    Closed,

    #[error("delivery cancelled")]
    Cancelled,

    #[error("webhook responded with status {0}")]
    Status(reqwest::StatusCode),

    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to encode alert card: {0}")]
    Encode(#[from] serde_json::Error),
}
