use crate::Result;
use chrono::Utc;
use railwatch_common::types::{DashboardSample, TrainRecord};
use tracing;

/// Builds the per-tick aggregate the dashboard collaborator charts:
/// total live trains, how many are late, and the worst delay, plus a
/// short status line naming the two worst offenders.
pub fn build_sample(records: &[TrainRecord], late_threshold_min: i64) -> DashboardSample {
    let mut late: Vec<&TrainRecord> = records
        .iter()
        .filter(|r| r.delay_minutes > late_threshold_min)
        .collect();
    late.sort_by(|a, b| b.delay_minutes.cmp(&a.delay_minutes));

    let max_delay_minutes = records.iter().map(|r| r.delay_minutes).max().unwrap_or(0);
    let status_line = if late.is_empty() {
        format!("All Clear ({} trains)", records.len())
    } else {
        late.iter()
            .take(2)
            .map(|r| format!("Tr{} +{}m", r.train_id, r.delay_minutes))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    DashboardSample {
        sampled_at: Utc::now(),
        total_trains: records.len(),
        late_count: late.len(),
        max_delay_minutes,
        status_line,
    }
}

/// One-way metric push to the remote dashboard (ThingSpeak-style
/// field1..field3 form upload). Failures are logged and swallowed; the
/// dashboard can miss a point without anyone caring.
pub struct DashboardSink {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl DashboardSink {
    pub fn new(url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub async fn push(&self, sample: &DashboardSample) {
        if let Err(e) = self.try_push(sample).await {
            tracing::warn!(error = %e, "Dashboard push failed");
        }
    }

    async fn try_push(&self, sample: &DashboardSample) -> Result<()> {
        let params = [
            ("api_key", self.api_key.clone()),
            ("field1", sample.total_trains.to_string()),
            ("field2", sample.late_count.to_string()),
            ("field3", sample.max_delay_minutes.to_string()),
            ("status", sample.status_line.clone()),
        ];
        self.client
            .post(&self.url)
            .form(&params)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
