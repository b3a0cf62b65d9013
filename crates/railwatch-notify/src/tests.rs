use crate::dashboard::build_sample;
use crate::DraftFileSink;
use chrono::Utc;
use railwatch_common::types::{Direction, TrainRecord};
use tempfile::TempDir;

fn rec(train: &str, delay: i64) -> TrainRecord {
    TrainRecord {
        id: 0,
        observed_at: Utc::now(),
        train_id: train.to_string(),
        direction: Direction::Inbound,
        status: if delay > 5 { "LATE" } else { "At Stop" }.to_string(),
        delay_minutes: delay,
        station: "Ashland".to_string(),
    }
}

#[test]
fn sample_all_clear() {
    let sample = build_sample(&[rec("508", 0), rec("510", 3)], 5);
    assert_eq!(sample.total_trains, 2);
    assert_eq!(sample.late_count, 0);
    assert_eq!(sample.max_delay_minutes, 3);
    assert_eq!(sample.status_line, "All Clear (2 trains)");
}

#[test]
fn sample_names_two_worst_offenders() {
    let sample = build_sample(&[rec("508", 25), rec("510", 8), rec("512", 12)], 5);
    assert_eq!(sample.late_count, 3);
    assert_eq!(sample.max_delay_minutes, 25);
    assert_eq!(sample.status_line, "Tr508 +25m | Tr512 +12m");
}

#[test]
fn sample_of_empty_feed() {
    let sample = build_sample(&[], 5);
    assert_eq!(sample.total_trains, 0);
    assert_eq!(sample.max_delay_minutes, 0);
    assert_eq!(sample.status_line, "All Clear (0 trains)");
}

#[tokio::test]
async fn draft_file_is_replaced_atomically() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("drafts").join("current_email_draft.txt");
    let sink = DraftFileSink::new(&path);

    sink.write("first draft").await.unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "first draft");

    sink.write("second draft").await.unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "second draft");

    // No temp file left behind.
    assert!(!path.with_extension("tmp").exists());
}
