/// Errors raised by the outbound sinks.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// An HTTP request to an external endpoint failed.
    #[error("notify: HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The external API answered with a non-success response.
    #[error("notify: API error: status={status}, body={body}")]
    Api { status: u16, body: String },

    /// Writing the draft artifact failed.
    #[error("notify: draft write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` alias for sink operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
