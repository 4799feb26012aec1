//! Snapshot monitor
//!
//! Consumes the snapshot stream for one symbol, throttles it to the push
//! interval, maintains the price and price-change windows, runs the
//! detectors and hands every alert to the sink.

use crate::alert::{build_detectors, AlertEvent, AlertKind, Detector, DetectorInput, Severity};
use crate::analytics::RollingWindow;
use crate::config::{Config, DisplayConfig, MonitorConfig};
use crate::feed::{DerivedTick, Snapshot};
use crate::notify::AlertSink;
use crate::telemetry::{incr_counter, record_alert, CounterMetric};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Admits at most one tick per interval
#[derive(Debug, Clone)]
pub struct RateGate {
    interval: Duration,
    last: Option<Instant>,
}

impl RateGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// True if at least `interval` passed since the last admitted tick
    pub fn admit(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last {
            if now.saturating_duration_since(last) < self.interval {
                return false;
            }
        }
        self.last = Some(now);
        true
    }
}

/// Single-symbol monitoring pipeline
pub struct Monitor {
    symbol: String,
    warmup_changes: usize,
    gate: RateGate,
    prices: RollingWindow<Snapshot>,
    changes: RollingWindow<DerivedTick>,
    last: Option<Snapshot>,
    detectors: Vec<Box<dyn Detector>>,
    sink: Arc<dyn AlertSink>,
    display: Option<DisplayConfig>,
}

impl Monitor {
    /// Build a monitor with the configured detectors
    pub fn new(config: &Config, sink: Arc<dyn AlertSink>) -> Self {
        Self::from_parts(
            config.feed.symbol.clone(),
            &config.monitor,
            build_detectors(&config.detectors),
            sink,
        )
        .with_display(config.feed.display.clone())
    }

    pub fn from_parts(
        symbol: impl Into<String>,
        config: &MonitorConfig,
        detectors: Vec<Box<dyn Detector>>,
        sink: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            warmup_changes: config.warmup_changes,
            gate: RateGate::new(config.push_interval()),
            prices: RollingWindow::new(config.window_size),
            changes: RollingWindow::new(config.window_size),
            last: None,
            detectors,
            sink,
            display: None,
        }
    }

    /// Also log prices converted to a display unit
    pub fn with_display(mut self, display: Option<DisplayConfig>) -> Self {
        self.display = display;
        self
    }

    /// Latest admitted price in the display unit, if one is configured
    pub fn display_price(&self) -> Option<(f64, &str)> {
        let display = self.display.as_ref()?;
        let price = self.last.as_ref()?.last_price;
        Some((display.convert(price), display.unit.as_str()))
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Admitted snapshots currently retained
    pub fn prices(&self) -> &RollingWindow<Snapshot> {
        &self.prices
    }

    /// Price-change history currently retained
    pub fn changes(&self) -> &RollingWindow<DerivedTick> {
        &self.changes
    }

    /// Process one snapshot, returning the alerts it raised
    ///
    /// `at` drives the rate gate; `now` stamps the alerts.
    pub fn handle_snapshot(
        &mut self,
        snapshot: Snapshot,
        at: Instant,
        now: DateTime<Utc>,
    ) -> Vec<AlertEvent> {
        if snapshot.symbol != self.symbol {
            tracing::debug!(symbol = %snapshot.symbol, "Ignoring snapshot for other symbol");
            return Vec::new();
        }

        if !self.gate.admit(at) {
            return Vec::new();
        }
        incr_counter(CounterMetric::SnapshotsAdmitted);

        if let Some(previous) = &self.last {
            self.changes.push(DerivedTick::between(previous, &snapshot));
        }
        self.prices.push(snapshot.clone());

        let alerts = if self.changes.size() > self.warmup_changes {
            self.evaluate(&snapshot, now)
        } else {
            Vec::new()
        };

        let price = snapshot.last_price;
        self.last = Some(snapshot);

        if alerts.is_empty() {
            match self.display_price() {
                Some((display_price, unit)) => tracing::debug!(
                    symbol = %self.symbol,
                    price,
                    display_price = format_args!("{:.2} {}", display_price, unit),
                    changes = self.changes.size(),
                    "Snapshot evaluated"
                ),
                None => tracing::debug!(
                    symbol = %self.symbol,
                    price,
                    changes = self.changes.size(),
                    "Snapshot evaluated"
                ),
            }
        }
        alerts
    }

    fn evaluate(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> Vec<AlertEvent> {
        let input = DetectorInput {
            symbol: &self.symbol,
            snapshot,
            changes: &self.changes,
            now,
        };

        let alerts: Vec<AlertEvent> = self
            .detectors
            .iter()
            .filter_map(|d| d.evaluate(&input))
            .collect();

        for alert in &alerts {
            record_alert(alert.kind);
            self.dispatch(alert.clone());
        }
        alerts
    }

    fn dispatch(&self, alert: AlertEvent) {
        tracing::info!(
            kind = %alert.kind,
            severity = %alert.severity,
            symbol = %alert.symbol,
            detail = %alert.message,
            "Alert raised"
        );

        if let Err(e) = self.sink.send(alert) {
            tracing::warn!(error = %e, "Failed to queue alert");
        }
    }

    /// Run until the stream ends or `shutdown` fires
    pub async fn run(mut self, mut rx: mpsc::Receiver<Snapshot>, shutdown: CancellationToken) {
        tracing::info!(symbol = %self.symbol, detectors = self.detectors.len(), "Monitor started");
        self.dispatch(AlertEvent::new(
            AlertKind::Health,
            Severity::Info,
            self.symbol.clone(),
            "monitor started",
            Utc::now(),
        ));

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Shutdown requested, stopping monitor");
                    break;
                }
                next = rx.recv() => match next {
                    Some(snapshot) => {
                        self.handle_snapshot(snapshot, Instant::now(), Utc::now());
                    }
                    None => {
                        tracing::warn!("Snapshot stream ended");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectorsConfig;
    use crate::feed::SnapshotStatus;
    use crate::notify::NotifyError;
    use chrono::TimeZone;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CollectSink(Mutex<Vec<AlertEvent>>);

    impl AlertSink for CollectSink {
        fn send(&self, alert: AlertEvent) -> Result<(), NotifyError> {
            self.0.lock().push(alert);
            Ok(())
        }
    }

    struct FullSink;

    impl AlertSink for FullSink {
        fn send(&self, _alert: AlertEvent) -> Result<(), NotifyError> {
            Err(NotifyError::QueueFull)
        }
    }

    /// Counts evaluations and never alerts
    struct CountingDetector(Arc<AtomicUsize>);

    impl Detector for CountingDetector {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn evaluate(&self, _input: &DetectorInput<'_>) -> Option<AlertEvent> {
            self.0.fetch_add(1, Ordering::SeqCst);
            None
        }
    }

    fn ts() -> DateTime<Utc> {
        Utc.timestamp_opt(1_704_067_200, 0).unwrap()
    }

    fn snapshot(symbol: &str, price: f64) -> Snapshot {
        Snapshot {
            symbol: symbol.to_string(),
            last_price: price,
            open: price,
            high: price,
            low: price,
            volume: 0.0,
            turnover: 0.0,
            timestamp: ts(),
            status: SnapshotStatus::Normal,
        }
    }

    fn unthrottled() -> MonitorConfig {
        MonitorConfig {
            push_interval_secs: 0,
            ..Default::default()
        }
    }

    fn jump_only() -> DetectorsConfig {
        let mut config = DetectorsConfig::default();
        config.trend.enabled = false;
        config.volatility.enabled = false;
        config.health.enabled = false;
        config
    }

    #[test]
    fn test_rate_gate() {
        let start = Instant::now();
        let mut gate = RateGate::new(Duration::from_secs(12));

        assert!(gate.admit(start));
        assert!(!gate.admit(start + Duration::from_secs(5)));
        assert!(!gate.admit(start + Duration::from_millis(11_999)));
        assert!(gate.admit(start + Duration::from_secs(12)));
        assert!(!gate.admit(start + Duration::from_secs(20)));
        assert!(gate.admit(start + Duration::from_secs(24)));
    }

    #[test]
    fn test_throttled_snapshots_skip_windows() {
        let sink = Arc::new(CollectSink::default());
        let mut monitor =
            Monitor::from_parts("XAUUSD", &MonitorConfig::default(), Vec::new(), sink);
        let start = Instant::now();

        monitor.handle_snapshot(snapshot("XAUUSD", 100.0), start, ts());
        monitor.handle_snapshot(snapshot("XAUUSD", 105.0), start + Duration::from_secs(3), ts());
        monitor.handle_snapshot(snapshot("XAUUSD", 101.0), start + Duration::from_secs(12), ts());

        assert_eq!(monitor.prices().size(), 2);
        assert_eq!(monitor.changes().size(), 1);
        assert!((monitor.changes().latest().unwrap().price_change - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_other_symbols_ignored() {
        let sink = Arc::new(CollectSink::default());
        let mut monitor = Monitor::from_parts("XAUUSD", &unthrottled(), Vec::new(), sink);
        let now = Instant::now();

        monitor.handle_snapshot(snapshot("XAGUSD", 30.0), now, ts());
        assert!(monitor.prices().is_empty());

        monitor.handle_snapshot(snapshot("XAUUSD", 100.0), now, ts());
        assert_eq!(monitor.prices().size(), 1);
    }

    #[test]
    fn test_warmup_before_evaluation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let detectors: Vec<Box<dyn Detector>> = vec![Box::new(CountingDetector(calls.clone()))];
        let sink = Arc::new(CollectSink::default());
        let mut monitor = Monitor::from_parts("XAUUSD", &unthrottled(), detectors, sink);
        let now = Instant::now();

        // Changes after each snapshot: 0, 1, 2, 3, 4
        for (i, price) in [100.0, 101.0, 102.0, 103.0, 104.0].into_iter().enumerate() {
            monitor.handle_snapshot(snapshot("XAUUSD", price), now, ts());
            let expected = i.saturating_sub(2);
            assert_eq!(calls.load(Ordering::SeqCst), expected, "after snapshot {}", i);
        }
    }

    #[test]
    fn test_jump_alert_dispatched() {
        let sink = Arc::new(CollectSink::default());
        let mut monitor = Monitor::from_parts(
            "XAUUSD",
            &unthrottled(),
            build_detectors(&jump_only()),
            sink.clone(),
        );
        let now = Instant::now();

        let mut price = 2650.0;
        for _ in 0..=25 {
            assert!(monitor.handle_snapshot(snapshot("XAUUSD", price), now, ts()).is_empty());
            price -= 0.2;
        }
        // Last price was (price + 0.2); jump by +5 from there
        let alerts = monitor.handle_snapshot(snapshot("XAUUSD", price + 0.2 + 5.0), now, ts());

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Jump);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[0].symbol, "XAUUSD");
        assert_eq!(alerts[0].timestamp, ts());
        assert!(alerts[0].message.contains("z=5.00"), "{}", alerts[0].message);

        let sent = sink.0.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, AlertKind::Jump);
    }

    #[test]
    fn test_sink_errors_are_not_fatal() {
        let mut monitor = Monitor::from_parts(
            "XAUUSD",
            &unthrottled(),
            build_detectors(&jump_only()),
            Arc::new(FullSink),
        );
        let now = Instant::now();

        let mut price = 2650.0;
        for _ in 0..=25 {
            monitor.handle_snapshot(snapshot("XAUUSD", price), now, ts());
            price -= 0.2;
        }
        let alerts = monitor.handle_snapshot(snapshot("XAUUSD", price + 5.2), now, ts());
        assert_eq!(alerts.len(), 1);
    }

    #[test]
    fn test_display_price() {
        let sink = Arc::new(CollectSink::default());
        let mut monitor = Monitor::from_parts("XAUUSD", &unthrottled(), Vec::new(), sink);
        let now = Instant::now();

        monitor.handle_snapshot(snapshot("XAUUSD", 2650.0), now, ts());
        assert!(monitor.display_price().is_none());

        let mut monitor = monitor.with_display(Some(DisplayConfig::default()));
        assert!(monitor.display_price().is_some());
        monitor.handle_snapshot(snapshot("XAUUSD", 3110.35), now, ts());

        let (price, unit) = monitor.display_price().unwrap();
        assert!((price - 692.0).abs() < 1e-9);
        assert_eq!(unit, "CNY/g");
    }

    #[test]
    fn test_windows_bounded() {
        let config = MonitorConfig {
            window_size: 10,
            push_interval_secs: 0,
            ..Default::default()
        };
        let sink = Arc::new(CollectSink::default());
        let mut monitor = Monitor::from_parts("XAUUSD", &config, Vec::new(), sink);
        let now = Instant::now();

        for i in 0..50 {
            monitor.handle_snapshot(snapshot("XAUUSD", 100.0 + i as f64), now, ts());
        }
        assert_eq!(monitor.prices().size(), 10);
        assert_eq!(monitor.changes().size(), 10);
        assert_eq!(monitor.prices().latest().unwrap().last_price, 149.0);
    }

    #[tokio::test]
    async fn test_run_announces_start_and_stops_on_stream_end() {
        let sink = Arc::new(CollectSink::default());
        let monitor = Monitor::from_parts("XAUUSD", &unthrottled(), Vec::new(), sink.clone());
        let (tx, rx) = mpsc::channel(8);

        tx.send(snapshot("XAUUSD", 100.0)).await.unwrap();
        drop(tx);
        monitor.run(rx, CancellationToken::new()).await;

        let sent = sink.0.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, AlertKind::Health);
        assert_eq!(sent[0].severity, Severity::Info);
        assert_eq!(sent[0].message, "monitor started");
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let sink = Arc::new(CollectSink::default());
        let monitor = Monitor::from_parts("XAUUSD", &unthrottled(), Vec::new(), sink);
        let (_tx, rx) = mpsc::channel::<Snapshot>(8);
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(monitor.run(rx, shutdown.clone()));
        shutdown.cancel();

        let result = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(result.is_ok());
    }
}
