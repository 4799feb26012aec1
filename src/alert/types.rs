//! Alert event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of condition raised the alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    /// Abnormal single-tick price move
    Jump,
    /// Sustained directional move
    Trend,
    /// Short-horizon volatility spike
    Volatility,
    /// Feed or monitor health
    Health,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::Jump => "Jump",
            AlertKind::Trend => "Trend",
            AlertKind::Volatility => "Volatility",
            AlertKind::Health => "Health",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Critical => "Critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A triggered alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub severity: Severity,
    /// Symbol that triggered the alert (empty for process-level alerts)
    pub symbol: String,
    /// Human-readable description
    pub message: String,
    /// When the alert was raised
    pub timestamp: DateTime<Utc>,
}

impl AlertEvent {
    pub fn new(
        kind: AlertKind,
        severity: Severity,
        symbol: impl Into<String>,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            severity,
            symbol: symbol.into(),
            message: message.into(),
            timestamp,
        }
    }

    /// Identifier shown to recipients: `{symbol}-{unix seconds}`
    pub fn alert_id(&self) -> String {
        format!("{}-{}", self.symbol, self.timestamp.timestamp())
    }
}

impl fmt::Display for AlertEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [{}] {} Alert - {}: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.severity,
            self.kind,
            self.symbol,
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_alert_display() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 5).unwrap();
        let alert = AlertEvent::new(
            AlertKind::Jump,
            Severity::Critical,
            "XAUUSD",
            "price jump detected",
            ts,
        );
        assert_eq!(
            alert.to_string(),
            "[2024-01-01 09:30:05] [Critical] Jump Alert - XAUUSD: price jump detected"
        );
    }

    #[test]
    fn test_alert_id() {
        let ts = Utc.timestamp_opt(1_704_067_200, 0).unwrap();
        let alert = AlertEvent::new(AlertKind::Trend, Severity::Info, "XAUUSD", "up", ts);
        assert_eq!(alert.alert_id(), "XAUUSD-1704067200");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_alert_serializes() {
        let ts = Utc.timestamp_opt(0, 0).unwrap();
        let alert = AlertEvent::new(AlertKind::Volatility, Severity::Warning, "X", "m", ts);
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["kind"], "Volatility");
        assert_eq!(json["severity"], "Warning");
    }
}
