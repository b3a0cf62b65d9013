use crate::payload::FeedPayload;
use crate::FeedError;
use async_trait::async_trait;
use std::time::Duration;

/// Source of raw feed payloads. The scheduler is written against this
/// trait so tests can drive the pipeline with canned payloads.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<FeedPayload, FeedError>;
}

/// HTTP feed client with a bounded request timeout.
///
/// A timeout is surfaced as [`FeedError::Http`] and treated by callers
/// exactly like any other fetch failure: skip the tick, retry next
/// cadence.
pub struct HttpFeedClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpFeedClient {
    pub fn new(url: &str, api_key: Option<&str>, timeout_secs: u64) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            api_key: api_key.map(str::to_string),
        })
    }
}

#[async_trait]
impl FeedSource for HttpFeedClient {
    async fn fetch(&self) -> Result<FeedPayload, FeedError> {
        let mut req = self.client.get(&self.url);
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
            });
        }
        let payload = resp.json::<FeedPayload>().await?;
        Ok(payload)
    }
}
