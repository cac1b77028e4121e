//! Per-chunk fetch errors
//!
//! Every variant is recoverable: the aggregator drops the chunk and moves on.

use reqwest::StatusCode;
use thiserror::Error;

/// Longest response body kept in an error message
const MAX_BODY_CHARS: usize = 512;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection refused, timeout, or the body could not be read
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// Body was not valid JSON
    #[error("malformed response body: {0}")]
    Decode(String),

    /// `success: false` in an otherwise successful response
    #[error("API returned error: {message}")]
    Api { message: String },

    #[error("unrecognized response shape: {0}")]
    UnrecognizedShape(String),
}

impl FetchError {
    pub(crate) fn status(status: StatusCode, body: &str) -> Self {
        let body = if body.chars().count() > MAX_BODY_CHARS {
            let cut: String = body.chars().take(MAX_BODY_CHARS).collect();
            format!("{}...", cut)
        } else {
            body.to_string()
        };
        Self::Status { status, body }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
