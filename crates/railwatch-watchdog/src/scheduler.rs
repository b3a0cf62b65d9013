use crate::state::lock_tracker;
use chrono::{Duration as ChronoDuration, Utc};
use railwatch_alert::AlertTracker;
use railwatch_feed::{FeedSource, Normalizer};
use railwatch_notify::{dashboard, AlertSink, DashboardSink, DraftFileSink};
use railwatch_report::{build_incidents, render_draft, ReceiptAnalyzer};
use railwatch_storage::TrainStore;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing;

/// Drives the fetch → normalize → persist → alert → report cycle on a
/// fixed cadence. One tick runs to completion before the next begins;
/// the shutdown signal is only consulted at the wait point, so an
/// in-flight tick always finishes its persistence step.
pub struct Scheduler {
    feed: Arc<dyn FeedSource>,
    normalizer: Normalizer,
    store: Arc<TrainStore>,
    tracker: Arc<Mutex<AlertTracker>>,
    analyzer: ReceiptAnalyzer,
    alert_sinks: Vec<Box<dyn AlertSink>>,
    draft_sink: DraftFileSink,
    dashboard_sink: Option<DashboardSink>,
    poll_interval_secs: u64,
    recent_window_min: i64,
    late_threshold_min: i64,
}

impl Scheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        feed: Arc<dyn FeedSource>,
        normalizer: Normalizer,
        store: Arc<TrainStore>,
        tracker: Arc<Mutex<AlertTracker>>,
        analyzer: ReceiptAnalyzer,
        alert_sinks: Vec<Box<dyn AlertSink>>,
        draft_sink: DraftFileSink,
        dashboard_sink: Option<DashboardSink>,
        poll_interval_secs: u64,
        recent_window_min: i64,
        late_threshold_min: i64,
    ) -> Self {
        Self {
            feed,
            normalizer,
            store,
            tracker,
            analyzer,
            alert_sinks,
            draft_sink,
            dashboard_sink,
            poll_interval_secs,
            recent_window_min,
            late_threshold_min,
        }
    }

    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            poll_interval_secs = self.poll_interval_secs,
            "Watchdog scheduler started"
        );
        let mut tick = interval(Duration::from_secs(self.poll_interval_secs));
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = tick.tick() => self.run_tick().await,
                _ = shutdown.changed() => {
                    tracing::info!("Shutdown signal received; scheduler stopping");
                    return;
                }
            }
        }
    }

    /// One full cycle. Every stage failure is contained here: a fetch
    /// error skips the tick, a persistence error drops the batch loudly,
    /// and sink errors are logged per sink. Nothing propagates.
    pub async fn run_tick(&self) {
        let payload = match self.feed.fetch().await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Feed fetch failed; skipping tick");
                return;
            }
        };

        let observed_at = Utc::now();
        let batch = self.normalizer.normalize(&payload, observed_at);
        if batch.dropped > 0 {
            tracing::warn!(dropped = batch.dropped, "Malformed items in poll batch");
        }

        match self.store.insert(&batch.records) {
            Ok(n) => tracing::info!(rows = n, "Poll batch persisted"),
            // Alerting still runs on the in-memory batch; the loss is
            // visible to an operator as a storage-layer error.
            Err(e) => tracing::error!(error = %e, "Persistence failure; batch not stored"),
        }

        let mut alerts = {
            let mut tracker = lock_tracker(&self.tracker);
            let active: HashSet<String> =
                batch.records.iter().map(|r| r.train_id.clone()).collect();
            let alerts: Vec<_> = batch
                .records
                .iter()
                .filter_map(|rec| tracker.observe(rec, observed_at))
                .collect();
            tracker.retain_active(&active);
            alerts
        };

        // Attach the 7-day receipt narrative to each fresh alert.
        for alert in &mut alerts {
            match self.analyzer.summarize(&alert.train_id) {
                Ok(summary) => {
                    if let Some(line) = ReceiptAnalyzer::narrative(&summary) {
                        alert.message.push(' ');
                        alert.message.push_str(&line);
                    }
                }
                Err(e) => {
                    tracing::error!(train_id = %alert.train_id, error = %e, "Receipt lookup failed")
                }
            }
        }

        for alert in &alerts {
            tracing::info!(
                train_id = %alert.train_id,
                severity = %alert.severity,
                delay = alert.delay_minutes,
                "Incident alert"
            );
            for sink in &self.alert_sinks {
                if let Err(e) = sink.send(alert).await {
                    tracing::error!(sink = sink.name(), error = %e, "Alert delivery failed");
                }
            }
        }

        self.refresh_draft().await;

        if let Some(dashboard_sink) = &self.dashboard_sink {
            let sample = dashboard::build_sample(&batch.records, self.late_threshold_min);
            dashboard_sink.push(&sample).await;
        }
    }

    /// Regenerates the draft artifact from the persisted recent window.
    async fn refresh_draft(&self) {
        let recent = match self.store.recent(ChronoDuration::minutes(self.recent_window_min)) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(error = %e, "Recent-window query failed; draft not refreshed");
                return;
            }
        };
        let incidents = match build_incidents(&recent, self.late_threshold_min, &self.analyzer) {
            Ok(incidents) => incidents,
            Err(e) => {
                tracing::error!(error = %e, "Receipt aggregation failed; draft not refreshed");
                return;
            }
        };
        let draft = render_draft(Utc::now(), &incidents);
        if let Err(e) = self.draft_sink.write(&draft).await {
            tracing::error!(error = %e, "Draft write failed");
        }
    }
}

/// Retention loop, independent of the poll cadence: prunes rows older
/// than the retention window once a day.
pub async fn run_retention(
    store: Arc<TrainStore>,
    retention_days: i64,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut tick = interval(Duration::from_secs(24 * 60 * 60));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = tick.tick() => {
                match store.prune(ChronoDuration::days(retention_days)) {
                    Ok(0) => {}
                    Ok(n) => tracing::info!(rows = n, "Retention prune complete"),
                    Err(e) => tracing::error!(error = %e, "Retention prune failed"),
                }
            }
            _ = shutdown.changed() => return,
        }
    }
}
