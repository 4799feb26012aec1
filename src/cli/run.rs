//! Run command implementation

use crate::config::Config;
use crate::feed::{ReplayFeed, ReplayInput, SnapshotSource};
use crate::monitor::Monitor;
use crate::notify::{AlertSink, LogSink, Notifier};
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Newline-delimited JSON snapshots to replay (stdin when omitted)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Delay between replayed records in milliseconds
    #[arg(long, default_value_t = 0)]
    pub pace_ms: u64,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let shutdown = CancellationToken::new();

        let input = match &self.input {
            Some(path) => ReplayInput::File(path.clone()),
            None => ReplayInput::Stdin,
        };
        let feed = ReplayFeed::new(input, config.feed.channel_buffer)
            .with_pace(Duration::from_millis(self.pace_ms));
        let rx = feed.subscribe().await.context("Failed to open snapshot feed")?;

        let notifier = if config.notifier.enabled {
            let notifier = Notifier::with_shutdown(config.notifier.clone(), &shutdown)
                .context("Failed to start notifier")?;
            Some(Arc::new(notifier))
        } else {
            tracing::warn!("Notifier disabled, alerts will only be logged");
            None
        };
        let sink: Arc<dyn AlertSink> = match &notifier {
            Some(notifier) => notifier.clone() as Arc<dyn AlertSink>,
            None => Arc::new(LogSink),
        };

        let monitor = Monitor::new(config, sink);
        let mut handle = tokio::spawn(monitor.run(rx, shutdown.clone()));

        tokio::select! {
            result = &mut handle => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Monitor task failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl-C, shutting down");
                shutdown.cancel();
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, "Monitor task failed");
                }
            }
        }

        if let Some(notifier) = notifier {
            notifier.close().await;
        }
        tracing::info!("Shutdown complete");
        Ok(())
    }
}
