use chrono::Duration;
use railwatch_alert::{AlertState, AlertTracker};
use railwatch_common::types::TrainRecord;
use railwatch_storage::{Result, TrainStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Read-only view of the watchdog's live state.
///
/// External collaborators (the chat command surface, dashboards) query
/// through this handle instead of reaching into the pipeline; it exposes
/// the persisted series and the current alert snapshot, nothing more.
#[derive(Clone)]
pub struct QueryHandle {
    store: Arc<TrainStore>,
    tracker: Arc<Mutex<AlertTracker>>,
}

impl QueryHandle {
    pub fn new(store: Arc<TrainStore>, tracker: Arc<Mutex<AlertTracker>>) -> Self {
        Self { store, tracker }
    }

    pub fn recent(&self, minutes: i64) -> Result<Vec<TrainRecord>> {
        self.store.recent(Duration::minutes(minutes))
    }

    pub fn history(&self, train_id: &str, days: i64) -> Result<Vec<TrainRecord>> {
        self.store.history(train_id, Duration::days(days))
    }

    /// Current per-train alert state, cloned out of the tracker.
    pub fn alert_snapshot(&self) -> HashMap<String, AlertState> {
        lock_tracker(&self.tracker).snapshot()
    }
}

/// Lock the tracker, recovering from a poisoned Mutex if necessary.
pub fn lock_tracker(tracker: &Mutex<AlertTracker>) -> MutexGuard<'_, AlertTracker> {
    tracker
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
