// src/error.rs
use thiserror::Error;

use crate::browser::ResourceKind;

/// Failures of the page driver capability (network, status, blocked resource).
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream {url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("blocked non-document response ({kind}) from {url}")]
    Blocked { url: String, kind: ResourceKind },
}

/// Failure of a single record transform. Cloneable so a cached failure can be
/// handed to every waiter of the same key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("normalizing record `{key}` failed: {reason}")]
pub struct NormalizeError {
    pub key: String,
    pub reason: String,
}

impl NormalizeError {
    pub fn new(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Everything a feed invocation can fail with. Capability errors are carried
/// through untouched; nothing here is retried.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("decoding blog listing: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("rendering feed: {0}")]
    Render(String),
}

impl FeedError {
    /// True when the failure originated upstream (fetch or decode), as opposed to
    /// local transform/render problems.
    pub fn is_upstream(&self) -> bool {
        matches!(self, FeedError::Driver(_) | FeedError::Decode(_))
    }
}
