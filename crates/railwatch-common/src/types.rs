use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Travel direction of a tracked train.
///
/// The feed encodes this as a binary `direction_id`; the stored form is
/// the short code `"IN"` / `"OUT"`.
///
/// # Examples
///
/// ```
/// use railwatch_common::types::Direction;
///
/// let dir: Direction = "IN".parse().unwrap();
/// assert_eq!(dir, Direction::Inbound);
/// assert_eq!(dir.as_str(), "IN");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inbound => "IN",
            Direction::Outbound => "OUT",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN" => Ok(Direction::Inbound),
            "OUT" => Ok(Direction::Outbound),
            _ => Err(format!("unknown direction: {s}")),
        }
    }
}

/// One normalized observation of one train at one instant.
///
/// `id` is the store's autoincrement surrogate key; records that have not
/// been persisted yet carry `0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainRecord {
    pub id: i64,
    pub observed_at: DateTime<Utc>,
    pub train_id: String,
    pub direction: Direction,
    pub status: String,
    pub delay_minutes: i64,
    pub station: String,
}

/// Status string the feed uses for a canceled trip.
pub const STATUS_CANCELED: &str = "CANCELED";

/// Service severity for one train, used by the alert tracker.
///
/// `Major` and `Canceled` share the same rank: both take the
/// high-severity alert path but are tracked as distinct reasons, so the
/// ordering is expressed through [`Severity::rank`] rather than a derived
/// `Ord`.
///
/// # Examples
///
/// ```
/// use railwatch_common::types::Severity;
///
/// let sev: Severity = "major".parse().unwrap();
/// assert_eq!(sev, Severity::Major);
/// assert_eq!(sev.rank(), Severity::Canceled.rank());
/// assert!(sev.rank() > Severity::Late.rank());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Late,
    Major,
    Canceled,
}

impl Severity {
    /// Ordinal rank: Normal(0) < Late(1) < Major(2) = Canceled(2).
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Normal => 0,
            Severity::Late => 1,
            Severity::Major | Severity::Canceled => 2,
        }
    }

}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Normal => write!(f, "normal"),
            Severity::Late => write!(f, "late"),
            Severity::Major => write!(f, "major"),
            Severity::Canceled => write!(f, "canceled"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Severity::Normal),
            "late" => Ok(Severity::Late),
            "major" => Ok(Severity::Major),
            "canceled" => Ok(Severity::Canceled),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// A deduplicated incident notification emitted by the alert tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAlert {
    pub train_id: String,
    pub severity: Severity,
    pub delay_minutes: i64,
    pub station: String,
    pub message: String,
    pub emitted_at: DateTime<Utc>,
}

/// Trailing-history summary attached to a live incident.
///
/// Derived on demand from the store; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptSummary {
    pub train_id: String,
    pub window_days: i64,
    /// Distinct dates on which the train exceeded the late threshold or
    /// was canceled, ascending.
    pub failure_dates: Vec<NaiveDate>,
    pub max_delay_by_date: BTreeMap<NaiveDate, i64>,
}

/// Per-tick aggregate pushed to the dashboard collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSample {
    pub sampled_at: DateTime<Utc>,
    pub total_trains: usize,
    pub late_count: usize,
    pub max_delay_minutes: i64,
    pub status_line: String,
}
