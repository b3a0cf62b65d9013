use crate::payload::{FeedPayload, RawVehicle};
use crate::FeedError;
use chrono::{DateTime, Utc};
use railwatch_common::types::{Direction, TrainRecord};
use std::collections::HashMap;
use tracing;

/// Station name used when a vehicle has no stop relationship.
const IN_TRANSIT: &str = "In Transit";

/// Result of normalizing one poll batch.
pub struct NormalizedBatch {
    pub records: Vec<TrainRecord>,
    /// Items dropped as malformed. Surfaced for logging and metrics;
    /// a non-zero count never fails the batch.
    pub dropped: usize,
}

/// Maps raw feed vehicles into canonical [`TrainRecord`]s.
///
/// Stateless apart from the late threshold, which rewrites the cosmetic
/// status to `"LATE"` once the delay exceeds it.
pub struct Normalizer {
    late_threshold_min: i64,
}

impl Normalizer {
    pub fn new(late_threshold_min: i64) -> Self {
        Self { late_threshold_min }
    }

    /// Normalizes a whole payload. Every record in the batch shares the
    /// single `observed_at` capture instant, which keeps timestamps
    /// non-decreasing within the batch.
    pub fn normalize(&self, payload: &FeedPayload, observed_at: DateTime<Utc>) -> NormalizedBatch {
        let stops: HashMap<&str, &str> = payload
            .included
            .iter()
            .filter(|inc| inc.kind.as_deref() == Some("stop"))
            .filter_map(|inc| {
                let id = inc.id.as_deref()?;
                let name = inc.attributes.as_ref()?.name.as_deref()?;
                Some((id, name))
            })
            .collect();

        let mut records = Vec::with_capacity(payload.data.len());
        let mut dropped = 0;
        for vehicle in &payload.data {
            match self.normalize_vehicle(vehicle, &stops, observed_at) {
                Ok(Some(rec)) => records.push(rec),
                Ok(None) => {}
                Err(e) => {
                    dropped += 1;
                    tracing::warn!(error = %e, "Dropped malformed feed item");
                }
            }
        }
        NormalizedBatch { records, dropped }
    }

    /// One raw vehicle → zero or one record.
    ///
    /// `Ok(None)` is reserved for `ADDED` vehicles (extra equipment the
    /// operator slots in ad hoc); anything missing a required field is a
    /// [`FeedError::MalformedRecord`].
    fn normalize_vehicle(
        &self,
        vehicle: &RawVehicle,
        stops: &HashMap<&str, &str>,
        observed_at: DateTime<Utc>,
    ) -> Result<Option<TrainRecord>, FeedError> {
        let attrs = &vehicle.attributes;

        let train_id = attrs
            .label
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| malformed("missing vehicle label"))?;

        let raw_status = attrs
            .current_status
            .as_deref()
            .ok_or_else(|| malformed(&format!("train {train_id}: missing current_status")))?;
        if raw_status == "ADDED" {
            return Ok(None);
        }

        let direction = match attrs.direction_id {
            Some(0) => Direction::Outbound,
            Some(1) => Direction::Inbound,
            Some(other) => {
                return Err(malformed(&format!(
                    "train {train_id}: direction_id {other} out of range"
                )))
            }
            None => return Err(malformed(&format!("train {train_id}: missing direction_id"))),
        };

        // Feed reports delay in seconds; absent means on time.
        let delay_minutes = attrs
            .delay
            .map(|secs| (secs / 60.0).round() as i64)
            .unwrap_or(0);

        let station = vehicle
            .relationships
            .as_ref()
            .and_then(|r| r.stop.as_ref())
            .and_then(|s| s.data.as_ref())
            .and_then(|d| stops.get(d.id.as_str()).copied())
            .unwrap_or(IN_TRANSIT)
            .to_string();

        let status = if delay_minutes > self.late_threshold_min {
            "LATE".to_string()
        } else {
            match raw_status {
                "IN_TRANSIT_TO" => "Moving To".to_string(),
                "STOPPED_AT" => "At Stop".to_string(),
                other => other.to_string(),
            }
        };

        Ok(Some(TrainRecord {
            id: 0,
            observed_at,
            train_id: train_id.to_string(),
            direction,
            status,
            delay_minutes,
            station,
        }))
    }
}

fn malformed(reason: &str) -> FeedError {
    FeedError::MalformedRecord {
        reason: reason.to_string(),
    }
}
