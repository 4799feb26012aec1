//! Snapshot feed module
//!
//! Boundary with the market-data collaborator: wire records, normalized
//! snapshots, per-tick deltas and the source trait the monitor consumes.

mod replay;
mod types;

pub use replay::{ReplayFeed, ReplayInput};
pub use types::{DerivedTick, FeedError, RawSnapshot, Snapshot, SnapshotStatus};

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Trait for snapshot stream implementations
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Subscribe to normalized snapshots; the stream ends when the source is exhausted
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<Snapshot>>;
}
