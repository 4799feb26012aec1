//! Prometheus counters

use crate::alert::AlertKind;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Counter metric types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterMetric {
    /// Snapshot accepted from the feed
    SnapshotsReceived,
    /// Snapshot rejected during normalization
    SnapshotsMalformed,
    /// Snapshot dropped because the feed channel was full
    SnapshotsDropped,
    /// Snapshot admitted by the rate gate
    SnapshotsAdmitted,
    /// Alert delivered to the webhook
    AlertsDelivered,
    /// Alert given up after exhausting retries or on cancellation
    AlertsFailed,
    /// Alert rejected by the dispatcher queue
    AlertsDropped,
    /// Delivery attempt scheduled for retry
    DeliveryRetries,
}

impl CounterMetric {
    pub fn name(self) -> &'static str {
        match self {
            CounterMetric::SnapshotsReceived => "sentinel_snapshots_received_total",
            CounterMetric::SnapshotsMalformed => "sentinel_snapshots_malformed_total",
            CounterMetric::SnapshotsDropped => "sentinel_snapshots_dropped_total",
            CounterMetric::SnapshotsAdmitted => "sentinel_snapshots_admitted_total",
            CounterMetric::AlertsDelivered => "sentinel_alerts_delivered_total",
            CounterMetric::AlertsFailed => "sentinel_alerts_failed_total",
            CounterMetric::AlertsDropped => "sentinel_alerts_dropped_total",
            CounterMetric::DeliveryRetries => "sentinel_delivery_retries_total",
        }
    }
}

/// Increment a counter by one
pub fn incr_counter(metric: CounterMetric) {
    ::metrics::counter!(metric.name()).increment(1);
}

/// Count an alert raised by a detector, labelled by kind
pub fn record_alert(kind: AlertKind) {
    ::metrics::counter!("sentinel_alerts_raised_total", "kind" => kind.as_str()).increment(1);
}

/// Install the Prometheus exporter with an HTTP listener on `port`
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;

    tracing::info!(%addr, "Prometheus metrics exporter listening");
    Ok(())
}
