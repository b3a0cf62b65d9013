use crate::Thresholds;
use chrono::{DateTime, Utc};
use railwatch_common::types::{ServiceAlert, Severity, TrainRecord};
use std::collections::{HashMap, HashSet};
use tracing;

/// Per-train alert memory for the current incident streak.
#[derive(Debug, Clone)]
pub struct AlertState {
    pub severity: Severity,
    /// Instant the severity last changed.
    pub since: DateTime<Utc>,
    /// Whether a notification has already gone out for this streak.
    pub alerted: bool,
}

/// Tracks every active train and decides, per tick, whether the latest
/// observation opens a *new* incident worth notifying about.
///
/// An incident is a contiguous streak of degraded severity; within one
/// streak at most one alert is emitted, and only when severity reaches
/// the Major/Canceled rank. Returning to Normal rearms the train.
pub struct AlertTracker {
    thresholds: Thresholds,
    states: HashMap<String, AlertState>,
}

impl AlertTracker {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            states: HashMap::new(),
        }
    }

    /// Folds one observation into the per-train state. Returns an alert
    /// exactly on the tick where the streak first reaches the
    /// high-severity rank.
    pub fn observe(&mut self, record: &TrainRecord, now: DateTime<Utc>) -> Option<ServiceAlert> {
        let severity = self.thresholds.classify(record);
        let state = self
            .states
            .entry(record.train_id.clone())
            .or_insert(AlertState {
                severity: Severity::Normal,
                since: now,
                alerted: false,
            });

        if severity != state.severity {
            state.severity = severity;
            state.since = now;
        }

        if severity == Severity::Normal {
            // End of streak: rearm for the next incident.
            state.alerted = false;
            return None;
        }

        if severity.rank() < Severity::Major.rank() || state.alerted {
            if state.alerted {
                tracing::debug!(
                    train_id = %record.train_id,
                    severity = %severity,
                    "Alert suppressed (already notified for this streak)"
                );
            }
            return None;
        }

        state.alerted = true;
        let message = match severity {
            Severity::Canceled => format!(
                "Train {} has been CANCELED at {}.",
                record.train_id, record.station
            ),
            _ => format!(
                "Train {} is running {} minutes late at {}.",
                record.train_id, record.delay_minutes, record.station
            ),
        };
        Some(ServiceAlert {
            train_id: record.train_id.clone(),
            severity,
            delay_minutes: record.delay_minutes,
            station: record.station.clone(),
            message,
            emitted_at: now,
        })
    }

    /// Severity of one train as currently tracked.
    pub fn severity_of(&self, train_id: &str) -> Severity {
        self.states
            .get(train_id)
            .map(|s| s.severity)
            .unwrap_or(Severity::Normal)
    }

    /// Drops state for trains that vanished from the feed, so a train
    /// that reappears days later starts a fresh streak.
    pub fn retain_active(&mut self, active: &HashSet<String>) {
        self.states.retain(|id, _| active.contains(id));
    }

    /// Read-only view for the command surface.
    pub fn snapshot(&self) -> HashMap<String, AlertState> {
        self.states.clone()
    }
}
