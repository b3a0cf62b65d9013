//! Live vehicle feed: HTTP client and record normalizer.
//!
//! The feed is a JSON:API `vehicles` endpoint with `include=stop`. The
//! payload is decoded into loosely typed structures (every interesting
//! field is an `Option`) and validated field-by-field in the
//! [`normalizer`]; a vehicle missing a required field is dropped and
//! logged, never a batch abort.

pub mod client;
pub mod normalizer;
pub mod payload;

pub use client::{FeedSource, HttpFeedClient};
pub use normalizer::{NormalizedBatch, Normalizer};
pub use payload::FeedPayload;

/// Errors raised while fetching or normalizing the feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Transport-level failure, including request timeouts.
    #[error("feed: HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The feed answered with a non-success status code.
    #[error("feed: API returned status {status}")]
    Status { status: u16 },

    /// One raw vehicle item is missing a required field or carries an
    /// out-of-range value. Per-item; the rest of the batch continues.
    #[error("feed: malformed record: {reason}")]
    MalformedRecord { reason: String },
}
