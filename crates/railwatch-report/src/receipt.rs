use chrono::Duration;
use railwatch_common::types::{ReceiptSummary, STATUS_CANCELED};
use railwatch_storage::{Result, TrainStore};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Correlates a live incident against a train's trailing history.
///
/// Queries the store's per-train index on every call; the caller invokes
/// it only for currently degraded trains, so routine reports stay free of
/// stale history.
pub struct ReceiptAnalyzer {
    store: Arc<TrainStore>,
    late_threshold_min: i64,
    window_days: i64,
}

impl ReceiptAnalyzer {
    pub fn new(store: Arc<TrainStore>, late_threshold_min: i64, window_days: i64) -> Self {
        Self {
            store,
            late_threshold_min,
            window_days,
        }
    }

    /// Groups the train's trailing window by calendar date and picks out
    /// the dates on which service failed (max delay above the late
    /// threshold, or any cancellation).
    pub fn summarize(&self, train_id: &str) -> Result<ReceiptSummary> {
        let rows = self
            .store
            .history(train_id, Duration::days(self.window_days))?;

        let mut max_delay_by_date: BTreeMap<_, i64> = BTreeMap::new();
        let mut canceled_dates = BTreeSet::new();
        for row in &rows {
            let date = row.observed_at.date_naive();
            let entry = max_delay_by_date.entry(date).or_insert(i64::MIN);
            *entry = (*entry).max(row.delay_minutes);
            if row.status == STATUS_CANCELED {
                canceled_dates.insert(date);
            }
        }

        let failure_dates = max_delay_by_date
            .iter()
            .filter(|(date, max)| **max > self.late_threshold_min || canceled_dates.contains(*date))
            .map(|(date, _)| *date)
            .collect();

        Ok(ReceiptSummary {
            train_id: train_id.to_string(),
            window_days: self.window_days,
            failure_dates,
            max_delay_by_date,
        })
    }

    /// Narrative line for the draft. A single failure date is just
    /// today's incident, not a pattern, so it renders nothing.
    pub fn narrative(summary: &ReceiptSummary) -> Option<String> {
        let count = summary.failure_dates.len();
        if count <= 1 {
            return None;
        }
        let dates: Vec<String> = summary
            .failure_dates
            .iter()
            .map(|d| d.format("%m/%d").to_string())
            .collect();
        Some(format!(
            "HISTORY: Train {} has failed {} times in the last {} days ({}).",
            summary.train_id,
            count,
            summary.window_days,
            dates.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use railwatch_common::types::{Direction, TrainRecord};
    use tempfile::TempDir;

    fn setup() -> (TempDir, Arc<TrainStore>) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(TrainStore::open(&dir.path().join("logs.db")).unwrap());
        store.migrate().unwrap();
        (dir, store)
    }

    fn rec(train: &str, status: &str, delay: i64, days_ago: i64, hour_offset: i64) -> TrainRecord {
        TrainRecord {
            id: 0,
            observed_at: Utc::now() - Duration::days(days_ago) - Duration::hours(hour_offset),
            train_id: train.to_string(),
            direction: Direction::Inbound,
            status: status.to_string(),
            delay_minutes: delay,
            station: "Natick".to_string(),
        }
    }

    /// Observation pinned to mid-day UTC so hour offsets can never spill
    /// across a calendar date.
    fn rec_at_noon(train: &str, delay: i64, days_ago: i64, minute: u32) -> TrainRecord {
        let day = Utc::now().date_naive() - Duration::days(days_ago);
        TrainRecord {
            id: 0,
            observed_at: day.and_hms_opt(12, minute, 0).unwrap().and_utc(),
            train_id: train.to_string(),
            direction: Direction::Inbound,
            status: "At Stop".to_string(),
            delay_minutes: delay,
            station: "Natick".to_string(),
        }
    }

    #[test]
    fn max_delay_by_date_matches_reference_aggregation() {
        let (_dir, store) = setup();

        // Ten days of observations with known per-day maxima of
        // days_ago * 3; only the trailing window is aggregated.
        let mut records = Vec::new();
        for days_ago in 0..10 {
            let peak = days_ago * 3;
            records.push(rec_at_noon("508", peak - 2, days_ago, 0));
            records.push(rec_at_noon("508", peak, days_ago, 30));
            records.push(rec_at_noon("508", peak / 2, days_ago, 45));
        }
        store.insert(&records).unwrap();

        let analyzer = ReceiptAnalyzer::new(store, 5, 7);
        let summary = analyzer.summarize("508").unwrap();

        let today = Utc::now().date_naive();
        // Days 0..=6 are unambiguously inside a 7-day window; day 7's
        // inclusion depends on the time of day the test runs, and days
        // 8-9 are unambiguously outside.
        for days_ago in 0..=6 {
            let date = today - Duration::days(days_ago);
            assert_eq!(summary.max_delay_by_date[&date], days_ago * 3, "{date}");
        }
        assert!(!summary
            .max_delay_by_date
            .contains_key(&(today - Duration::days(8))));
        assert!(!summary
            .max_delay_by_date
            .contains_key(&(today - Duration::days(9))));

        // Failure dates: max delay above 5 -> days_ago >= 2.
        for days_ago in 2..=6 {
            assert!(summary.failure_dates.contains(&(today - Duration::days(days_ago))));
        }
        assert!(!summary.failure_dates.contains(&today));
        assert!(!summary
            .failure_dates
            .contains(&(today - Duration::days(1))));
    }

    #[test]
    fn canceled_day_counts_as_failure_even_without_delay() {
        let (_dir, store) = setup();
        store
            .insert(&[
                rec("508", "CANCELED", 0, 2, 0),
                rec("508", "At Stop", 1, 1, 0),
            ])
            .unwrap();

        let analyzer = ReceiptAnalyzer::new(store, 5, 7);
        let summary = analyzer.summarize("508").unwrap();

        assert_eq!(summary.failure_dates.len(), 1);
        assert_eq!(
            summary.failure_dates[0],
            (Utc::now() - Duration::days(2)).date_naive()
        );
    }

    #[test]
    fn narrative_requires_a_repeat_offender() {
        let (_dir, store) = setup();
        store.insert(&[rec("508", "LATE", 15, 2, 0)]).unwrap();

        let analyzer = ReceiptAnalyzer::new(store.clone(), 5, 7);
        let single = analyzer.summarize("508").unwrap();
        assert!(ReceiptAnalyzer::narrative(&single).is_none());

        store.insert(&[rec("508", "CANCELED", 0, 3, 0)]).unwrap();
        let double = analyzer.summarize("508").unwrap();
        let line = ReceiptAnalyzer::narrative(&double).unwrap();
        assert!(line.contains("Train 508 has failed 2 times"));
        assert!(line.contains("HISTORY"));
    }

    #[test]
    fn unknown_train_yields_empty_summary() {
        let (_dir, store) = setup();
        let analyzer = ReceiptAnalyzer::new(store, 5, 7);
        let summary = analyzer.summarize("999").unwrap();
        assert!(summary.failure_dates.is_empty());
        assert!(summary.max_delay_by_date.is_empty());
    }
}
