//! Market snapshot types

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Trading status of the instrument at snapshot time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotStatus {
    #[default]
    Normal,
    Suspended,
}

/// A normalized market snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Instrument symbol (e.g., "XAUUSD")
    pub symbol: String,
    /// Last traded price
    pub last_price: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    /// Cumulative traded volume
    pub volume: f64,
    /// Cumulative turnover
    pub turnover: f64,
    /// Exchange timestamp
    pub timestamp: DateTime<Utc>,
    pub status: SnapshotStatus,
}

impl Snapshot {
    pub fn is_suspended(&self) -> bool {
        self.status == SnapshotStatus::Suspended
    }
}

/// Snapshot as delivered on the wire, numeric fields still encoded as text
#[derive(Debug, Clone, Deserialize)]
pub struct RawSnapshot {
    pub symbol: String,
    pub last_price: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub volume: String,
    pub turnover: String,
    /// Unix timestamp in seconds
    pub timestamp: i64,
    /// 0 = normal, anything else = suspended
    #[serde(default)]
    pub suspended: i32,
}

/// Errors raised while normalizing a raw snapshot
#[derive(Debug, Error, PartialEq)]
pub enum FeedError {
    #[error("empty value for field {0}")]
    EmptyField(&'static str),
    #[error("failed to parse {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },
    #[error("timestamp out of range: {0}")]
    InvalidTimestamp(i64),
}

fn parse_field(raw: &str, field: &'static str) -> Result<f64, FeedError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FeedError::EmptyField(field));
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(FeedError::InvalidField {
            field,
            value: raw.to_string(),
        }),
    }
}

impl TryFrom<RawSnapshot> for Snapshot {
    type Error = FeedError;

    fn try_from(raw: RawSnapshot) -> Result<Self, Self::Error> {
        let timestamp = Utc
            .timestamp_opt(raw.timestamp, 0)
            .single()
            .ok_or(FeedError::InvalidTimestamp(raw.timestamp))?;

        Ok(Self {
            last_price: parse_field(&raw.last_price, "last_price")?,
            open: parse_field(&raw.open, "open")?,
            high: parse_field(&raw.high, "high")?,
            low: parse_field(&raw.low, "low")?,
            volume: parse_field(&raw.volume, "volume")?,
            turnover: parse_field(&raw.turnover, "turnover")?,
            timestamp,
            status: if raw.suspended == 0 {
                SnapshotStatus::Normal
            } else {
                SnapshotStatus::Suspended
            },
            symbol: raw.symbol,
        })
    }
}

/// Per-tick deltas between two consecutive snapshots
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DerivedTick {
    /// Absolute price change
    pub price_change: f64,
    /// Price change relative to the previous price (0 when the previous price is 0)
    pub price_change_rate: f64,
    /// Volume traded between the two snapshots
    pub volume_delta: f64,
}

impl DerivedTick {
    /// Derive deltas from `previous` to `current`
    pub fn between(previous: &Snapshot, current: &Snapshot) -> Self {
        let price_change = current.last_price - previous.last_price;
        let price_change_rate = if previous.last_price == 0.0 {
            0.0
        } else {
            price_change / previous.last_price
        };
        Self {
            price_change,
            price_change_rate,
            volume_delta: current.volume - previous.volume,
        }
    }

    /// Build a tick carrying only a price change (used for synthetic series)
    pub fn from_price_change(price_change: f64) -> Self {
        Self {
            price_change,
            ..Default::default()
        }
    }
}
