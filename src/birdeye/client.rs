//! Birdeye API client for bounded-range OHLCV requests
//!
//! One call to [`ChunkFetcher::fetch_chunk`] is exactly one HTTP request. The
//! client never retries or sleeps; pacing belongs to the caller.
//!
//! # Example
//! ```no_run
//! use birdeye_ohlcv::birdeye::{BirdeyeClient, ChunkFetcher};
//! use birdeye_ohlcv::chunk::TimeRange;
//! use birdeye_ohlcv::config::{Config, Credentials};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_file("default_config.json")?;
//!     let credentials = Credentials::from_env_file(".env")?;
//!     let client = BirdeyeClient::new(&config.common_parameters, &credentials)?;
//!
//!     let range = TimeRange::new(1744502400, 1744588800)?;
//!     let records = client
//!         .fetch_chunk(&config.ohlcv_requests[0], range, None)
//!         .await?;
//!     println!("Fetched {} records", records.len());
//!     Ok(())
//! }
//! ```

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::time::Duration as StdDuration;
use tracing::debug;

use super::error::{FetchError, FetchResult};
use super::types::{decode_response, Record};
use crate::chunk::TimeRange;
use crate::config::{CommonParameters, Credentials, RequestSpec};
use crate::error::SetupError;

/// Query parameter names the client owns
pub const TIME_FROM_PARAM: &str = "time_from";
pub const TIME_TO_PARAM: &str = "time_to";
pub const ADDRESS_PARAM: &str = "address";

/// Fetches the records of one request spec over one time range
pub trait ChunkFetcher {
    fn fetch_chunk(
        &self,
        spec: &RequestSpec,
        range: TimeRange,
        token_address: Option<&str>,
    ) -> impl Future<Output = FetchResult<Vec<Record>>> + Send;
}

/// Birdeye REST client
#[derive(Debug, Clone)]
pub struct BirdeyeClient {
    client: Client,
    base_url: String,
    headers: HeaderMap,
}

impl BirdeyeClient {
    /// Create a client from the shared API parameters and the API key
    pub fn new(common: &CommonParameters, credentials: &Credentials) -> Result<Self, SetupError> {
        let mut builder = Client::builder();
        if let Some(secs) = common.timeout_secs {
            builder = builder.timeout(StdDuration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| SetupError::HttpClient(e.to_string()))?;

        Ok(BirdeyeClient {
            client,
            base_url: common.base_url.trim_end_matches('/').to_string(),
            headers: build_headers(common, credentials)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an endpoint path
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }
}

impl ChunkFetcher for BirdeyeClient {
    async fn fetch_chunk(
        &self,
        spec: &RequestSpec,
        range: TimeRange,
        token_address: Option<&str>,
    ) -> FetchResult<Vec<Record>> {
        let url = self.endpoint_url(&spec.endpoint);
        let params = build_query(spec, range, token_address);

        debug!("GET {} ({}) params={:?}", url, spec.name, params);

        let response = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::status(status, &body));
        }

        let body = response.text().await?;
        let records = decode_response(&body)?;

        debug!(
            "{} returned {} records (HTTP {})",
            spec.name,
            records.len(),
            status.as_u16()
        );

        Ok(records)
    }
}

/// Merge the spec's default parameters with the chunk bounds and token
///
/// Spec parameters keep their configured order; `time_from`, `time_to` and
/// `address` replace any configured value. Null parameters are dropped.
pub fn build_query(
    spec: &RequestSpec,
    range: TimeRange,
    token_address: Option<&str>,
) -> Vec<(String, String)> {
    let mut params = spec.query_params.clone();
    params.insert(TIME_FROM_PARAM.to_string(), Value::from(range.start()));
    params.insert(TIME_TO_PARAM.to_string(), Value::from(range.end()));
    if let Some(address) = token_address {
        params.insert(ADDRESS_PARAM.to_string(), Value::from(address));
    }

    params
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(text) => Some((key, text)),
            other => Some((key, other.to_string())),
        })
        .collect()
}

fn build_headers(common: &CommonParameters, credentials: &Credentials) -> Result<HeaderMap, SetupError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    for (name, value) in common.extra_headers() {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| SetupError::InvalidConfig(format!("invalid header name '{}'", name)))?;
        let value = HeaderValue::from_str(value).map_err(|_| {
            SetupError::InvalidConfig(format!("invalid value for header '{}'", name))
        })?;
        headers.insert(name, value);
    }

    let key_header_name = common.api_key_header();
    let key_header = HeaderName::from_bytes(key_header_name.as_bytes()).map_err(|_| {
        SetupError::InvalidConfig(format!("invalid api_key_header '{}'", key_header_name))
    })?;
    let mut key_value = HeaderValue::from_str(credentials.api_key())
        .map_err(|_| SetupError::InvalidConfig("API key is not a valid header value".to_string()))?;
    key_value.set_sensitive(true);
    headers.insert(key_header, key_value);

    Ok(headers)
}
