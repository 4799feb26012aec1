//! Webhook dispatcher
//!
//! A bounded queue drained by a fixed pool of workers. Each worker takes one
//! alert, posts its card to the webhook and retries with backoff until it is
//! delivered or retries run out. A shutdown request stops further retries but
//! every queued alert still gets its first attempt.

use super::backoff::RetryPolicy;
use super::error::NotifyError;
use super::AlertSink;
use crate::alert::AlertEvent;
use crate::config::NotifierConfig;
use crate::telemetry::{incr_counter, CounterMetric};
use parking_lot::Mutex;
use reqwest::header::CONTENT_TYPE;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// HTTP delivery shared by all workers
struct Delivery {
    client: reqwest::Client,
    url: String,
    policy: RetryPolicy,
    /// Fired by `close` once the workers have drained the queue
    cancel: CancellationToken,
    /// Fired on shutdown or close; ends pending backoff waits
    stop_retries: CancellationToken,
}

impl Delivery {
    /// Deliver one alert, returning the number of attempts it took
    async fn deliver(&self, alert: &AlertEvent) -> Result<u32, NotifyError> {
        let body = serde_json::to_vec(&alert.to_card())?;
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 1;

        loop {
            if self.cancel.is_cancelled() {
                return Err(NotifyError::Cancelled);
            }

            match self.post(&body).await {
                Ok(()) => return Ok(attempt),
                Err(NotifyError::Cancelled) => return Err(NotifyError::Cancelled),
                Err(e) if attempt >= max_attempts => return Err(e),
                Err(e) if self.stop_retries.is_cancelled() => {
                    tracing::warn!(
                        error = %e,
                        alert_id = %alert.alert_id(),
                        attempt,
                        "Webhook delivery failed, shutdown requested, not retrying"
                    );
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.policy.jittered_delay(attempt);
                    tracing::warn!(
                        error = %e,
                        alert_id = %alert.alert_id(),
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Webhook delivery failed, retrying"
                    );
                    incr_counter(CounterMetric::DeliveryRetries);

                    tokio::select! {
                        _ = self.cancel.cancelled() => return Err(NotifyError::Cancelled),
                        _ = self.stop_retries.cancelled() => return Err(NotifyError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
            }
        }
    }

    async fn post(&self, body: &[u8]) -> Result<(), NotifyError> {
        let request = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_vec())
            .send();

        let response = tokio::select! {
            _ = self.cancel.cancelled() => return Err(NotifyError::Cancelled),
            result = request => result?,
        };

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(NotifyError::Status(status))
        }
    }
}

/// Asynchronous webhook notifier
pub struct Notifier {
    tx: Mutex<Option<mpsc::Sender<AlertEvent>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
    cancel: CancellationToken,
}

impl Notifier {
    /// Create a notifier and start its workers
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: NotifierConfig) -> Result<Self, NotifyError> {
        let cancel = CancellationToken::new();
        let stop_retries = cancel.clone();
        Self::with_tokens(config, cancel, stop_retries)
    }

    /// Create a notifier whose backoff waits end when `shutdown` fires
    ///
    /// Queued alerts are still attempted once; only retries are cut short.
    /// Call [`close`](Self::close) afterwards to drain the queue.
    pub fn with_shutdown(
        config: NotifierConfig,
        shutdown: &CancellationToken,
    ) -> Result<Self, NotifyError> {
        let cancel = CancellationToken::new();
        let stop_retries = shutdown.child_token();
        Self::with_tokens(config, cancel, stop_retries)
    }

    fn with_tokens(
        config: NotifierConfig,
        cancel: CancellationToken,
        stop_retries: CancellationToken,
    ) -> Result<Self, NotifyError> {
        if config.webhook_url.trim().is_empty() {
            return Err(NotifyError::EmptyWebhookUrl);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(NotifyError::Client)?;

        let delivery = Arc::new(Delivery {
            client,
            url: config.webhook_url.clone(),
            policy: RetryPolicy::from_config(&config),
            cancel: cancel.clone(),
            stop_retries,
        });

        let (tx, rx) = mpsc::channel(config.queue_size.max(1));
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let worker_count = config.workers.max(1);
        let workers = (0..worker_count)
            .map(|id| tokio::spawn(worker_loop(id, rx.clone(), delivery.clone())))
            .collect();

        tracing::info!(
            workers = worker_count,
            queue_size = config.queue_size.max(1),
            max_retries = config.max_retries,
            "Notifier started"
        );

        Ok(Self {
            tx: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
            closed: AtomicBool::new(false),
            cancel,
        })
    }

    /// Queue an alert without blocking
    pub fn send(&self, alert: AlertEvent) -> Result<(), NotifyError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(NotifyError::Closed);
        }

        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            return Err(NotifyError::Closed);
        };

        match tx.try_send(alert) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(alert)) => {
                incr_counter(CounterMetric::AlertsDropped);
                tracing::warn!(alert_id = %alert.alert_id(), "Alert queue full, dropping alert");
                Err(NotifyError::QueueFull)
            }
            Err(TrySendError::Closed(_)) => Err(NotifyError::Closed),
        }
    }

    /// Stop accepting alerts, drain the queue, wait for the workers, then cancel
    ///
    /// Calling it again is a no-op.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        {
            self.tx.lock().take();
        }
        let workers = {
            let mut guard = self.workers.lock();
            std::mem::take(&mut *guard)
        };

        for handle in workers {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Notifier worker panicked");
            }
        }

        self.cancel.cancel();
        tracing::info!("Notifier closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl AlertSink for Notifier {
    fn send(&self, alert: AlertEvent) -> Result<(), NotifyError> {
        Notifier::send(self, alert)
    }
}

async fn worker_loop(
    id: usize,
    rx: Arc<tokio::sync::Mutex<mpsc::Receiver<AlertEvent>>>,
    delivery: Arc<Delivery>,
) {
    loop {
        let next = { rx.lock().await.recv().await };
        let Some(alert) = next else { break };

        match delivery.deliver(&alert).await {
            Ok(attempts) => {
                incr_counter(CounterMetric::AlertsDelivered);
                tracing::info!(
                    worker = id,
                    alert_id = %alert.alert_id(),
                    kind = %alert.kind,
                    attempts,
                    "Alert delivered"
                );
            }
            Err(e) => {
                incr_counter(CounterMetric::AlertsFailed);
                tracing::error!(
                    worker = id,
                    alert_id = %alert.alert_id(),
                    kind = %alert.kind,
                    error = %e,
                    "Alert delivery failed"
                );
            }
        }
    }

    tracing::debug!(worker = id, "Notifier worker stopped");
}
