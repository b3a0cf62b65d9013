use anyhow::{Context, Result};
use railwatch_alert::{AlertTracker, Thresholds};
use railwatch_feed::{HttpFeedClient, Normalizer};
use railwatch_notify::{AlertSink, DashboardSink, DraftFileSink, WebhookSink};
use railwatch_report::ReceiptAnalyzer;
use railwatch_storage::TrainStore;
use railwatch_watchdog::config::WatchdogConfig;
use railwatch_watchdog::scheduler::{run_retention, Scheduler};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("railwatch=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("config/watchdog.toml");
    let config = WatchdogConfig::load(config_path)
        .with_context(|| format!("loading config from {config_path}"))?;

    // The store's shape is a precondition for every other component, so
    // a migration failure here is fatal.
    let store = Arc::new(TrainStore::open(Path::new(&config.db_path))?);
    store.migrate().context("startup schema migration failed")?;
    tracing::info!(db = %config.db_path, "Store ready");

    let feed = Arc::new(HttpFeedClient::new(
        &config.feed_url,
        config.api_key.as_deref(),
        config.fetch_timeout_secs,
    )?);
    let normalizer = Normalizer::new(config.late_threshold_min);
    let tracker = Arc::new(Mutex::new(AlertTracker::new(Thresholds {
        late_min: config.late_threshold_min,
        major_min: config.major_threshold_min,
    })));
    let analyzer = ReceiptAnalyzer::new(
        store.clone(),
        config.late_threshold_min,
        config.receipt_window_days,
    );

    let mut alert_sinks: Vec<Box<dyn AlertSink>> = Vec::new();
    if let Some(url) = &config.webhook_url {
        alert_sinks.push(Box::new(WebhookSink::new(url)));
    } else {
        tracing::warn!("No webhook_url configured; alerts will only be logged");
    }
    let draft_sink = DraftFileSink::new(Path::new(&config.draft_path));
    let dashboard_sink = match (&config.dashboard_url, &config.dashboard_api_key) {
        (Some(url), Some(key)) => Some(DashboardSink::new(url, key)),
        _ => None,
    };

    let scheduler = Scheduler::new(
        feed,
        normalizer,
        store.clone(),
        tracker,
        analyzer,
        alert_sinks,
        draft_sink,
        dashboard_sink,
        config.poll_interval_secs,
        config.recent_window_min,
        config.late_threshold_min,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let retention = tokio::spawn(run_retention(
        store,
        config.retention_days,
        shutdown_rx.clone(),
    ));
    let pipeline = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

    signal::ctrl_c().await?;
    tracing::info!("Ctrl-C received; letting the current tick finish");
    let _ = shutdown_tx.send(true);
    let _ = pipeline.await;
    let _ = retention.await;
    tracing::info!("Watchdog stopped");
    Ok(())
}
