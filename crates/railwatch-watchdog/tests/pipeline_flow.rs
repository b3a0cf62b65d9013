//! Full-pipeline test: canned feed payloads drive fetch → normalize →
//! persist → alert → draft, and the alert sink must see exactly one
//! notification per incident streak.

use async_trait::async_trait;
use railwatch_alert::{AlertTracker, Thresholds};
use railwatch_common::types::{ServiceAlert, Severity};
use railwatch_feed::{FeedError, FeedPayload, FeedSource, Normalizer};
use railwatch_notify::{AlertSink, DraftFileSink, NotifyError};
use railwatch_report::ReceiptAnalyzer;
use railwatch_storage::TrainStore;
use railwatch_watchdog::scheduler::Scheduler;
use railwatch_watchdog::state::QueryHandle;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Feed source that serves a scripted sequence of payloads, then
/// failures.
struct ScriptedFeed {
    payloads: Mutex<Vec<FeedPayload>>,
}

impl ScriptedFeed {
    fn new(payloads: Vec<FeedPayload>) -> Self {
        Self {
            payloads: Mutex::new(payloads),
        }
    }
}

#[async_trait]
impl FeedSource for ScriptedFeed {
    async fn fetch(&self) -> Result<FeedPayload, FeedError> {
        let mut payloads = self.payloads.lock().unwrap();
        if payloads.is_empty() {
            return Err(FeedError::Status { status: 503 });
        }
        Ok(payloads.remove(0))
    }
}

/// Sink that records every alert it is handed.
#[derive(Default)]
struct RecordingSink {
    alerts: Mutex<Vec<ServiceAlert>>,
}

/// Newtype so the sink trait can be implemented for a shared handle
/// without running into the orphan rule on `Arc<RecordingSink>`.
struct SinkHandle(Arc<RecordingSink>);

#[async_trait]
impl AlertSink for SinkHandle {
    async fn send(&self, alert: &ServiceAlert) -> Result<(), NotifyError> {
        self.0.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

fn tick_payload(train: &str, status: &str, delay_minutes: i64) -> FeedPayload {
    serde_json::from_value(json!({
        "data": [{
            "attributes": {
                "label": train,
                "current_status": status,
                "delay": delay_minutes * 60,
                "direction_id": 1
            },
            "relationships": {
                "stop": { "data": { "id": "place-WML-0199" } }
            }
        }],
        "included": [{
            "type": "stop",
            "id": "place-WML-0199",
            "attributes": { "name": "West Natick" }
        }]
    }))
    .unwrap()
}

struct Harness {
    _dir: TempDir,
    scheduler: Scheduler,
    store: Arc<TrainStore>,
    tracker: Arc<Mutex<AlertTracker>>,
    sink: Arc<RecordingSink>,
    draft_path: std::path::PathBuf,
}

fn harness(payloads: Vec<FeedPayload>) -> Harness {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(TrainStore::open(&dir.path().join("logs.db")).unwrap());
    store.migrate().unwrap();

    let tracker = Arc::new(Mutex::new(AlertTracker::new(Thresholds {
        late_min: 5,
        major_min: 20,
    })));
    let sink = Arc::new(RecordingSink::default());
    let draft_path = dir.path().join("draft.txt");

    let scheduler = Scheduler::new(
        Arc::new(ScriptedFeed::new(payloads)),
        Normalizer::new(5),
        store.clone(),
        tracker.clone(),
        ReceiptAnalyzer::new(store.clone(), 5, 7),
        vec![Box::new(SinkHandle(sink.clone()))],
        DraftFileSink::new(&draft_path),
        None,
        120,
        30,
        5,
    );

    Harness {
        _dir: dir,
        scheduler,
        store,
        tracker,
        sink,
        draft_path,
    }
}

#[tokio::test]
async fn six_tick_incident_emits_exactly_one_alert() {
    // Delays 0,0,6,22,25,3 with late=5 / major=20: severities must run
    // Normal,Normal,Late,Major,Major,Normal with one alert at the first
    // Major tick.
    let delays = [0i64, 0, 6, 22, 25, 3];
    let payloads = delays
        .iter()
        .map(|d| tick_payload("508", "STOPPED_AT", *d))
        .collect();
    let h = harness(payloads);

    let expected = [
        Severity::Normal,
        Severity::Normal,
        Severity::Late,
        Severity::Major,
        Severity::Major,
        Severity::Normal,
    ];
    for (i, want) in expected.iter().enumerate() {
        h.scheduler.run_tick().await;
        let got = h.tracker.lock().unwrap().severity_of("508");
        assert_eq!(got, *want, "severity after tick {i}");
        let alerts_so_far = h.sink.alerts.lock().unwrap().len();
        assert_eq!(alerts_so_far, if i >= 3 { 1 } else { 0 }, "alerts after tick {i}");
    }

    let alerts = h.sink.alerts.lock().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].train_id, "508");
    assert_eq!(alerts[0].severity, Severity::Major);
    assert_eq!(alerts[0].delay_minutes, 22);
    assert_eq!(alerts[0].station, "West Natick");
    drop(alerts);

    // All six observations were persisted.
    assert_eq!(h.store.count().unwrap(), 6);
}

#[tokio::test]
async fn recovery_and_relapse_emits_a_second_alert() {
    let delays = [25i64, 25, 0, 25];
    let payloads = delays
        .iter()
        .map(|d| tick_payload("508", "STOPPED_AT", *d))
        .collect();
    let h = harness(payloads);

    for _ in 0..4 {
        h.scheduler.run_tick().await;
    }
    assert_eq!(h.sink.alerts.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn fetch_failure_skips_tick_without_side_effects() {
    // Scripted feed is empty, so every fetch fails.
    let h = harness(Vec::new());

    h.scheduler.run_tick().await;

    assert_eq!(h.store.count().unwrap(), 0);
    assert!(h.sink.alerts.lock().unwrap().is_empty());
    assert!(!h.draft_path.exists(), "a failed tick must not touch the draft");
}

#[tokio::test]
async fn cancellation_alert_carries_receipt_history() {
    // Two prior failure days in the store, then a live cancellation.
    let h = harness(vec![tick_payload("508", "CANCELED", 0)]);

    let mk = |status: &str, delay: i64, days_ago: i64| railwatch_common::types::TrainRecord {
        id: 0,
        observed_at: chrono::Utc::now() - chrono::Duration::days(days_ago),
        train_id: "508".to_string(),
        direction: railwatch_common::types::Direction::Inbound,
        status: status.to_string(),
        delay_minutes: delay,
        station: "West Natick".to_string(),
    };
    h.store
        .insert(&[mk("LATE", 30, 2), mk("CANCELED", 0, 4)])
        .unwrap();

    h.scheduler.run_tick().await;

    let alerts = h.sink.alerts.lock().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, Severity::Canceled);
    assert!(alerts[0].message.contains("CANCELED"));
    assert!(
        alerts[0].message.contains("HISTORY: Train 508 has failed 3 times"),
        "receipt narrative missing: {}",
        alerts[0].message
    );
}

#[tokio::test]
async fn draft_reflects_current_degraded_state() {
    let h = harness(vec![
        tick_payload("508", "STOPPED_AT", 25),
        tick_payload("508", "STOPPED_AT", 0),
    ]);

    h.scheduler.run_tick().await;
    let degraded = std::fs::read_to_string(&h.draft_path).unwrap();
    assert!(degraded.contains("CURRENT INCIDENTS"));
    assert!(degraded.contains("Train 508: Delayed 25 min."));

    h.scheduler.run_tick().await;
    let recovered = std::fs::read_to_string(&h.draft_path).unwrap();
    // The 25-minute observation is still inside the 30-minute window,
    // so the draft keeps reporting it until it ages out.
    assert!(recovered.contains("Train 508"));
}

#[tokio::test]
async fn query_handle_exposes_store_and_alert_state() {
    let h = harness(vec![tick_payload("508", "STOPPED_AT", 25)]);
    h.scheduler.run_tick().await;

    let queries = QueryHandle::new(h.store.clone(), h.tracker.clone());
    let recent = queries.recent(30).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].train_id, "508");

    let history = queries.history("508", 7).unwrap();
    assert_eq!(history.len(), 1);

    let snapshot = queries.alert_snapshot();
    assert!(snapshot["508"].alerted);
    assert_eq!(snapshot["508"].severity, Severity::Major);
}
