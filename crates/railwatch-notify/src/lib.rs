//! Outbound side effects triggered by core events.
//!
//! Every sink is fire-and-forget from the scheduler's point of view:
//! delivery is best-effort and at-least-once, failures are logged and
//! never propagate back into the tick. Alert sinks implement
//! [`AlertSink`] so new notification targets plug in without touching
//! the pipeline.

pub mod dashboard;
pub mod error;
pub mod sinks;

#[cfg(test)]
mod tests;

pub use dashboard::DashboardSink;
pub use error::{NotifyError, Result};
pub use sinks::draft_file::DraftFileSink;
pub use sinks::webhook::WebhookSink;

use async_trait::async_trait;
use railwatch_common::types::ServiceAlert;

/// A delivery target for deduplicated incident alerts.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Delivers one alert. Errors mean the alert may be lost; the
    /// caller logs and moves on.
    async fn send(&self, alert: &ServiceAlert) -> Result<()>;

    /// Short name for log lines (e.g. `"webhook"`).
    fn name(&self) -> &str;
}
