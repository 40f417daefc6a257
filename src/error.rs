//! Error types for the aggregation pipeline.

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Body excerpts attached to fetch errors are cut to this many characters.
pub const ERROR_BODY_LIMIT: usize = 200;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration. Raised at startup, never per request.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Every URL shape answered with a non-success status.
    #[error("fetch failed for {url} (status {status}): {body}")]
    Fetch { url: String, status: u16, body: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    #[error("unexpected response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl Error {
    pub(crate) fn fetch(url: &str, status: u16, body: &str) -> Self {
        Error::Fetch { url: url.to_string(), status, body: truncate_chars(body, ERROR_BODY_LIMIT) }
    }

    /// True for errors raised because the content source could not be read.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::Fetch { .. } | Error::Transport { .. } | Error::Timeout { .. } | Error::Decode { .. })
    }
}

pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
