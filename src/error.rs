//! Fatal setup errors
//!
//! Anything here aborts the run before the first request is sent.

use std::path::PathBuf;
use thiserror::Error;

use crate::chunk::InvalidRangeError;
use crate::time::TimeFormatError;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("BIRDEYE_API_KEY not found or not set (looked in {0})")]
    MissingApiKey(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not decode JSON from {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Time(#[from] TimeFormatError),

    #[error(transparent)]
    InvalidRange(#[from] InvalidRangeError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}
