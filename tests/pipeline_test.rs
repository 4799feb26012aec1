//! Replay file through the monitor to a mock webhook

use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use tick_sentinel::config::Config;
use tick_sentinel::feed::{ReplayFeed, ReplayInput, SnapshotSource};
use tick_sentinel::monitor::Monitor;
use tick_sentinel::notify::{AlertSink, Notifier};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(webhook_url: &str) -> Config {
    let toml = format!(
        r#"
        [feed]
        symbol = "XAUUSD"
        channel_buffer = 100

        [monitor]
        push_interval_secs = 0

        [detectors.trend]
        enabled = false

        [detectors.volatility]
        enabled = false

        [detectors.health]
        enabled = false

        [notifier]
        webhook_url = "{webhook_url}"
        base_backoff_ms = 10
        "#
    );
    toml::from_str(&toml).unwrap()
}

fn record(symbol: &str, tenths: i64, ts: i64) -> String {
    let price = format!("{}.{}", tenths / 10, tenths % 10);
    json!({
        "symbol": symbol,
        "last_price": price,
        "open": "2650.0",
        "high": "2660.0",
        "low": "2640.0",
        "volume": "100",
        "turnover": "265000",
        "timestamp": ts,
    })
    .to_string()
}

/// 25 drifts of -0.2 then a +5.0 jump, with noise lines mixed in
fn replay_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let mut tenths = 26_500;
    let mut ts = 1_704_067_200;

    for _ in 0..=25 {
        writeln!(file, "{}", record("XAUUSD", tenths, ts)).unwrap();
        tenths -= 2;
        ts += 12;
    }
    writeln!(file, "not json").unwrap();
    writeln!(file, "{}", record("XAGUSD", 300, ts)).unwrap();
    writeln!(file, "{}", record("XAUUSD", tenths + 2 + 50, ts)).unwrap();
    file
}

#[tokio::test]
async fn test_replay_raises_jump_alert() {
    let server = MockServer::start().await;
    // Startup notice
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "card": { "header": { "template": "blue" } } })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "card": {
                "header": {
                    "title": { "content": "🚨 Jump Alert - XAUUSD" },
                    "template": "red"
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = config(&format!("{}/hook", server.uri()));
    config.validate().unwrap();

    let file = replay_file();
    let feed = ReplayFeed::new(
        ReplayInput::File(file.path().to_path_buf()),
        config.feed.channel_buffer,
    );
    let rx = feed.subscribe().await.unwrap();

    let notifier = Arc::new(Notifier::new(config.notifier.clone()).unwrap());
    let monitor = Monitor::new(&config, notifier.clone() as Arc<dyn AlertSink>);

    monitor.run(rx, CancellationToken::new()).await;
    notifier.close().await;

    server.verify().await;
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}
