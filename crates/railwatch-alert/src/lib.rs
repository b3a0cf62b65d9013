//! Alert deduplication for service-degradation incidents.
//!
//! The poll cadence is on the order of minutes and an incident commonly
//! spans many polls, so the tracker must fire exactly once per incident
//! streak rather than once per tick. State is process-scoped and rebuilt
//! cold after a restart; the domain tolerates the resulting
//! at-least-once alerting.

pub mod tracker;


pub use tracker::{AlertState, AlertTracker};

use railwatch_common::types::{Severity, TrainRecord, STATUS_CANCELED};

/// Delay thresholds (minutes) that map an observation onto the severity
/// scale.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub late_min: i64,
    pub major_min: i64,
}

impl Thresholds {
    /// Severity of a single observation. Cancellation wins over any
    /// delay figure.
    pub fn classify(&self, record: &TrainRecord) -> Severity {
        if record.status == STATUS_CANCELED {
            Severity::Canceled
        } else if record.delay_minutes >= self.major_min {
            Severity::Major
        } else if record.delay_minutes >= self.late_min {
            Severity::Late
        } else {
            Severity::Normal
        }
    }
}
