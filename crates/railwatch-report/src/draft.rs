use crate::receipt::ReceiptAnalyzer;
use chrono::{DateTime, Utc};
use railwatch_common::types::{TrainRecord, STATUS_CANCELED};
use railwatch_storage::Result;
use std::collections::BTreeMap;

/// One degraded train in the current reporting window.
#[derive(Debug, Clone)]
pub struct IncidentLine {
    pub train_id: String,
    pub canceled: bool,
    pub max_delay_minutes: i64,
    pub receipt: Option<String>,
}

/// Folds the recent window into per-train incident lines, attaching a
/// receipt narrative to each. Trains at or under the late threshold are
/// left out entirely.
pub fn build_incidents(
    recent: &[TrainRecord],
    late_threshold_min: i64,
    analyzer: &ReceiptAnalyzer,
) -> Result<Vec<IncidentLine>> {
    let mut per_train: BTreeMap<&str, (bool, i64)> = BTreeMap::new();
    for rec in recent {
        let entry = per_train.entry(rec.train_id.as_str()).or_insert((false, i64::MIN));
        entry.0 |= rec.status == STATUS_CANCELED;
        entry.1 = entry.1.max(rec.delay_minutes);
    }

    let mut incidents = Vec::new();
    for (train_id, (canceled, max_delay)) in per_train {
        if !canceled && max_delay <= late_threshold_min {
            continue;
        }
        let summary = analyzer.summarize(train_id)?;
        incidents.push(IncidentLine {
            train_id: train_id.to_string(),
            canceled,
            max_delay_minutes: max_delay,
            receipt: ReceiptAnalyzer::narrative(&summary),
        });
    }
    Ok(incidents)
}

/// Renders the draft text regenerated every tick: an all-clear note when
/// nothing is degraded, otherwise the incident list with receipts.
pub fn render_draft(now: DateTime<Utc>, incidents: &[IncidentLine]) -> String {
    let timestamp = now.format("%I:%M %p").to_string();

    if incidents.is_empty() {
        return format!(
            "To Whom It May Concern,\n\n\
             This log confirms the Framingham/Worcester Line is operating ON SCHEDULE as of {timestamp}.\n\
             Status: Green | System Nominal\n\n\
             Sincerely,\n[Your Name]"
        );
    }

    let mut lines = Vec::with_capacity(incidents.len());
    for inc in incidents {
        let mut line = if inc.canceled {
            format!(" - Train {}: CANCELED today.", inc.train_id)
        } else {
            format!(" - Train {}: Delayed {} min.", inc.train_id, inc.max_delay_minutes)
        };
        if let Some(receipt) = &inc.receipt {
            line.push_str("\n   -> ");
            line.push_str(receipt);
        }
        lines.push(line);
    }

    format!(
        "To Customer Service,\n\n\
         I am writing to report unreliable service on the Worcester Line as of {timestamp}.\n\n\
         CURRENT INCIDENTS:\n{}\n\n\
         The recurrence of these delays indicates a systemic failure rather than isolated incidents.\n\
         Please provide an explanation for these repeated disruptions.\n\n\
         Sincerely,\n[Your Name]",
        lines.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use railwatch_common::types::Direction;
    use railwatch_storage::TrainStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Arc<TrainStore>) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(TrainStore::open(&dir.path().join("logs.db")).unwrap());
        store.migrate().unwrap();
        (dir, store)
    }

    fn rec(train: &str, status: &str, delay: i64, mins_ago: i64) -> TrainRecord {
        TrainRecord {
            id: 0,
            observed_at: Utc::now() - Duration::minutes(mins_ago),
            train_id: train.to_string(),
            direction: Direction::Outbound,
            status: status.to_string(),
            delay_minutes: delay,
            station: "Wellesley Hills".to_string(),
        }
    }

    #[test]
    fn all_clear_draft_when_nothing_degraded() {
        let draft = render_draft(Utc::now(), &[]);
        assert!(draft.contains("ON SCHEDULE"));
        assert!(draft.contains("Status: Green"));
    }

    #[test]
    fn degraded_trains_produce_incident_lines() {
        let (_dir, store) = setup();
        store
            .insert(&[
                rec("508", "LATE", 25, 5),
                rec("510", "At Stop", 0, 5),
                rec("512", "CANCELED", 0, 5),
            ])
            .unwrap();

        let analyzer = ReceiptAnalyzer::new(store.clone(), 5, 7);
        let recent = store.recent(Duration::minutes(30)).unwrap();
        let incidents = build_incidents(&recent, 5, &analyzer).unwrap();

        assert_eq!(incidents.len(), 2);
        let draft = render_draft(Utc::now(), &incidents);
        assert!(draft.contains("Train 508: Delayed 25 min."));
        assert!(draft.contains("Train 512: CANCELED today."));
        assert!(!draft.contains("510"));
    }

    #[test]
    fn repeat_offender_gets_receipt_in_draft() {
        let (_dir, store) = setup();
        store
            .insert(&[
                rec("508", "LATE", 18, 60 * 24 * 2),
                rec("508", "CANCELED", 0, 60 * 24 * 3),
                rec("508", "LATE", 25, 5),
            ])
            .unwrap();

        let analyzer = ReceiptAnalyzer::new(store.clone(), 5, 7);
        let recent = store.recent(Duration::minutes(30)).unwrap();
        let incidents = build_incidents(&recent, 5, &analyzer).unwrap();

        assert_eq!(incidents.len(), 1);
        let draft = render_draft(Utc::now(), &incidents);
        assert!(draft.contains("HISTORY: Train 508 has failed"));
    }
}
