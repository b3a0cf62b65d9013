use serde::Deserialize;

/// Daemon configuration, loaded from a TOML file. Every field has a
/// default so a bare file (or none at all) yields a runnable watchdog
/// against the public feed.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchdogConfig {
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    /// API key for the feed; the `MBTA_API_KEY` environment variable
    /// takes precedence over the file.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Minutes of delay at which a train counts as late.
    #[serde(default = "default_late_threshold_min")]
    pub late_threshold_min: i64,
    /// Minutes of delay at which the high-severity alert path fires.
    #[serde(default = "default_major_threshold_min")]
    pub major_threshold_min: i64,
    /// Width of the "current service" window the draft reports on.
    #[serde(default = "default_recent_window_min")]
    pub recent_window_min: i64,
    #[serde(default = "default_receipt_window_days")]
    pub receipt_window_days: i64,
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_draft_path")]
    pub draft_path: String,
    /// Alert webhook endpoint; alerts are dropped when unset.
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub dashboard_url: Option<String>,
    #[serde(default)]
    pub dashboard_api_key: Option<String>,
}

fn default_feed_url() -> String {
    "https://api-v3.mbta.com/vehicles?filter[route]=CR-Worcester&include=stop".to_string()
}

fn default_poll_interval_secs() -> u64 {
    120
}

fn default_fetch_timeout_secs() -> u64 {
    15
}

fn default_late_threshold_min() -> i64 {
    5
}

fn default_major_threshold_min() -> i64 {
    20
}

fn default_recent_window_min() -> i64 {
    30
}

fn default_receipt_window_days() -> i64 {
    7
}

fn default_retention_days() -> i64 {
    90
}

fn default_db_path() -> String {
    "data/train_logs.db".to_string()
}

fn default_draft_path() -> String {
    "data/current_email_draft.txt".to_string()
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            api_key: None,
            poll_interval_secs: default_poll_interval_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            late_threshold_min: default_late_threshold_min(),
            major_threshold_min: default_major_threshold_min(),
            recent_window_min: default_recent_window_min(),
            receipt_window_days: default_receipt_window_days(),
            retention_days: default_retention_days(),
            db_path: default_db_path(),
            draft_path: default_draft_path(),
            webhook_url: None,
            dashboard_url: None,
            dashboard_api_key: None,
        }
    }
}

impl WatchdogConfig {
    /// Loads the file when it exists, otherwise falls back to defaults.
    /// The environment override for the API key is applied either way.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let mut config = if std::path::Path::new(path).exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            tracing::info!(path, "No config file found; using defaults");
            Self::default()
        };
        if let Ok(key) = std::env::var("MBTA_API_KEY") {
            if !key.is_empty() {
                config.api_key = Some(key);
            }
        }
        Ok(config)
    }
}
