//! Newline-delimited JSON snapshot replay

use super::{RawSnapshot, Snapshot, SnapshotSource};
use crate::telemetry::{incr_counter, CounterMetric};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Where replayed records come from
#[derive(Debug, Clone)]
pub enum ReplayInput {
    Stdin,
    File(PathBuf),
}

/// Snapshot source reading one JSON [`RawSnapshot`] per line
///
/// Malformed lines are logged and skipped. Records are forwarded through a
/// bounded channel; when the consumer lags and the channel is full the
/// record is dropped rather than stalling the reader.
pub struct ReplayFeed {
    input: ReplayInput,
    buffer: usize,
    pace: Option<Duration>,
}

impl ReplayFeed {
    pub fn new(input: ReplayInput, buffer: usize) -> Self {
        Self {
            input,
            buffer: buffer.max(1),
            pace: None,
        }
    }

    /// Sleep `pace` between records to emulate a live stream
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = (!pace.is_zero()).then_some(pace);
        self
    }

    /// Parse a single line into a normalized snapshot
    fn parse_line(line: &str) -> anyhow::Result<Snapshot> {
        let raw: RawSnapshot = serde_json::from_str(line)?;
        Ok(Snapshot::try_from(raw)?)
    }

    async fn run_reader<R>(reader: R, tx: mpsc::Sender<Snapshot>, pace: Option<Duration>)
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut lines = BufReader::new(reader).lines();
        let mut line_no = 0u64;

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read replay input");
                    break;
                }
            };
            line_no += 1;

            if line.trim().is_empty() {
                continue;
            }

            let snapshot = match Self::parse_line(&line) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::error!(line = line_no, error = %e, "Dropping malformed snapshot");
                    incr_counter(CounterMetric::SnapshotsMalformed);
                    continue;
                }
            };

            match tx.try_send(snapshot) {
                Ok(()) => incr_counter(CounterMetric::SnapshotsReceived),
                Err(TrySendError::Full(snapshot)) => {
                    tracing::warn!(symbol = %snapshot.symbol, "Snapshot channel full, dropping snapshot");
                    incr_counter(CounterMetric::SnapshotsDropped);
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!("Snapshot receiver dropped, stopping replay");
                    return;
                }
            }

            if let Some(pace) = pace {
                tokio::time::sleep(pace).await;
            }
        }

        tracing::info!(lines = line_no, "Replay input exhausted");
    }
}

#[async_trait]
impl SnapshotSource for ReplayFeed {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<Snapshot>> {
        let (tx, rx) = mpsc::channel(self.buffer);
        let pace = self.pace;

        match &self.input {
            ReplayInput::Stdin => {
                tracing::info!("Replaying snapshots from stdin");
                tokio::spawn(Self::run_reader(tokio::io::stdin(), tx, pace));
            }
            ReplayInput::File(path) => {
                let file = tokio::fs::File::open(path).await.map_err(|e| {
                    anyhow::anyhow!("failed to open replay file {}: {}", path.display(), e)
                })?;
                tracing::info!(path = %path.display(), "Replaying snapshots from file");
                tokio::spawn(Self::run_reader(file, tx, pace));
            }
        }

        Ok(rx)
    }
}
