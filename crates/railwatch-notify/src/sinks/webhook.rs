use crate::{AlertSink, NotifyError, Result};
use async_trait::async_trait;
use railwatch_common::types::ServiceAlert;

/// Posts each alert as a JSON document to a configured endpoint; the
/// notification collaborator on the other end fans it out to chat or
/// social channels.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }

    fn body(alert: &ServiceAlert) -> serde_json::Value {
        serde_json::json!({
            "train_id": alert.train_id,
            "severity": alert.severity.to_string(),
            "delay_minutes": alert.delay_minutes,
            "station": alert.station,
            "message": alert.message,
            "emitted_at": alert.emitted_at.to_rfc3339(),
        })
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    async fn send(&self, alert: &ServiceAlert) -> Result<()> {
        let resp = self
            .client
            .post(&self.url)
            .json(&Self::body(alert))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "webhook"
    }
}
