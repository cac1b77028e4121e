//! Configuration management
//!
//! Loads the JSON request configuration and the API credential. Both are
//! read once at startup and passed explicitly into the pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::SetupError;

/// Environment key holding the Birdeye API key
pub const API_KEY_VAR: &str = "BIRDEYE_API_KEY";

/// Value shipped in the sample `.env`; treated as unset
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY_HERE";

pub const DEFAULT_API_KEY_HEADER: &str = "X-API-KEY";

/// `headers` entry naming the key header rather than being sent
const KEY_HEADER_ENTRY: &str = "api_key_header";

/// `endpoints` entry used by requests that omit their own endpoint
const DEFAULT_ENDPOINT_KEY: &str = "ohlcv";

const UNNAMED_REQUEST: &str = "unnamed_request";

// =============================================================================
// Config document
// =============================================================================

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub common_parameters: CommonParameters,
    /// Named endpoint paths; `ohlcv` backs requests without an `endpoint`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub endpoints: BTreeMap<String, String>,
    #[serde(default, alias = "request_configs")]
    pub ohlcv_requests: Vec<RequestSpec>,
}

/// Parameters shared by every request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommonParameters {
    pub base_url: String,
    /// Header carrying the API key; see [`CommonParameters::api_key_header`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_header: Option<String>,
    /// Default token address, used when `--token` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Extra headers sent with every request (e.g. `x-chain`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// HTTP timeout; no timeout when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl CommonParameters {
    /// Name of the header carrying the API key
    ///
    /// `api_key_header` first, then an `api_key_header` entry under
    /// `headers`, then [`DEFAULT_API_KEY_HEADER`].
    pub fn api_key_header(&self) -> &str {
        self.api_key_header
            .as_deref()
            .or_else(|| self.headers.get(KEY_HEADER_ENTRY).map(String::as_str))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_API_KEY_HEADER)
    }

    /// Headers sent verbatim with every request
    pub fn extra_headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .filter(|(name, _)| name.as_str() != KEY_HEADER_ENTRY)
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// One named data pull against the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default, alias = "parameters")]
    pub query_params: Map<String, Value>,
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SetupError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| SetupError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config =
            serde_json::from_str(&contents).map_err(|source| SetupError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;

        config.normalize();
        config.validate()?;

        debug!(
            "Loaded {} request(s) from {}",
            config.ohlcv_requests.len(),
            path.display()
        );
        Ok(config)
    }

    /// Fill in missing endpoints and names
    pub fn normalize(&mut self) {
        let default_endpoint = self.endpoints.get(DEFAULT_ENDPOINT_KEY).cloned();

        for spec in &mut self.ohlcv_requests {
            if spec.endpoint.trim().is_empty() {
                if let Some(endpoint) = &default_endpoint {
                    spec.endpoint = endpoint.clone();
                }
            }
            if spec.name.trim().is_empty() {
                spec.name = if spec.endpoint.trim().is_empty() {
                    UNNAMED_REQUEST.to_string()
                } else {
                    spec.endpoint.trim_matches('/').replace('/', "_")
                };
            }
        }
    }

    /// Reject configs the pipeline cannot run
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.common_parameters.base_url.trim().is_empty() {
            return Err(SetupError::InvalidConfig(
                "common_parameters.base_url is empty".to_string(),
            ));
        }
        if self.ohlcv_requests.is_empty() {
            return Err(SetupError::InvalidConfig(
                "no 'ohlcv_requests' defined".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for spec in &self.ohlcv_requests {
            if spec.endpoint.trim().is_empty() {
                return Err(SetupError::InvalidConfig(format!(
                    "request '{}' has no endpoint",
                    spec.name
                )));
            }
            if spec.name.contains(['/', '\\']) || spec.name == "." || spec.name == ".." {
                return Err(SetupError::InvalidConfig(format!(
                    "request name '{}' cannot be used as a file name",
                    spec.name
                )));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(SetupError::InvalidConfig(format!(
                    "duplicate request name '{}'",
                    spec.name
                )));
            }
        }

        Ok(())
    }

    /// Token address from the config, if one is set
    pub fn default_token_address(&self) -> Option<&str> {
        self.common_parameters
            .address
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())
    }
}

// =============================================================================
// Credentials
// =============================================================================

/// Birdeye API credential
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
}

impl Credentials {
    /// Wrap an API key, rejecting empty and placeholder values
    pub fn new(api_key: impl Into<String>) -> Result<Self, SetupError> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() || api_key == PLACEHOLDER_API_KEY {
            return Err(SetupError::MissingApiKey("provided value".to_string()));
        }
        Ok(Self { api_key })
    }

    /// Resolve `BIRDEYE_API_KEY` from the environment, then a `.env`-style file
    ///
    /// An exported key wins over the file. The file is parsed without
    /// touching the process environment.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, SetupError> {
        Self::resolve(std::env::var(API_KEY_VAR).ok(), path.as_ref())
    }

    fn resolve(exported: Option<String>, path: &Path) -> Result<Self, SetupError> {
        if let Some(credentials) = exported.and_then(|key| Self::new(key).ok()) {
            debug!("Using {} from the environment", API_KEY_VAR);
            return Ok(credentials);
        }

        read_env_file_key(path)
            .and_then(|key| Self::new(key).ok())
            .ok_or_else(|| {
                SetupError::MissingApiKey(format!("the environment and {}", path.display()))
            })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

/// Last `BIRDEYE_API_KEY` assignment in a `.env` file
fn read_env_file_key(path: &Path) -> Option<String> {
    let entries = match dotenv::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Could not read {}: {}", path.display(), e);
            return None;
        }
    };

    entries
        .filter_map(|entry| match entry {
            Ok(pair) => Some(pair),
            Err(e) => {
                debug!("Skipping unparsable line in {}: {}", path.display(), e);
                None
            }
        })
        .filter(|(key, _)| key == API_KEY_VAR)
        .map(|(_, value)| value)
        .last()
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"********")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "common_parameters": {
            "base_url": "https://public-api.birdeye.so",
            "api_key_header": "X-API-KEY",
            "address": "So11111111111111111111111111111111111111112",
            "headers": {"x-chain": "solana"}
        },
        "ohlcv_requests": [
            {"name": "sol_1m", "endpoint": "/defi/ohlcv", "query_params": {"type": "1m"}},
            {"name": "sol_15m", "endpoint": "/defi/ohlcv", "query_params": {"type": "15m"}}
        ]
    }"#;

    fn parse(json: &str) -> Config {
        let mut config: Config = serde_json::from_str(json).unwrap();
        config.normalize();
        config
    }

    #[test]
    fn test_parse_sample_config() {
        let config = parse(SAMPLE);
        config.validate().unwrap();

        assert_eq!(config.ohlcv_requests.len(), 2);
        assert_eq!(config.ohlcv_requests[1].name, "sol_15m");
        assert_eq!(config.common_parameters.headers["x-chain"], "solana");
        assert_eq!(
            config.default_token_address(),
            Some("So11111111111111111111111111111111111111112")
        );
        assert!(config.common_parameters.timeout_secs.is_none());
    }

    #[test]
    fn test_template_layout_aliases() {
        let config = parse(
            r#"{
                "common_parameters": {"base_url": "https://public-api.birdeye.so"},
                "endpoints": {"ohlcv": "/defi/ohlcv"},
                "request_configs": [
                    {"name": "candles_5m", "parameters": {"type": "5m"}}
                ]
            }"#,
        );
        config.validate().unwrap();

        let spec = &config.ohlcv_requests[0];
        assert_eq!(spec.endpoint, "/defi/ohlcv");
        assert_eq!(spec.query_params["type"], "5m");
        assert_eq!(config.common_parameters.api_key_header(), DEFAULT_API_KEY_HEADER);
        assert_eq!(config.default_token_address(), None);
    }

    #[test]
    fn test_key_header_name_from_headers_entry() {
        let config = parse(
            r#"{
                "common_parameters": {
                    "base_url": "https://public-api.birdeye.so",
                    "headers": {"accept": "application/json", "api_key_header": "x-api-key"}
                },
                "ohlcv_requests": [{"name": "a", "endpoint": "/defi/ohlcv"}]
            }"#,
        );
        let common = &config.common_parameters;

        assert_eq!(common.api_key_header(), "x-api-key");
        let extra: Vec<(&str, &str)> = common.extra_headers().collect();
        assert_eq!(extra, vec![("accept", "application/json")]);
    }

    #[test]
    fn test_explicit_key_header_wins_over_headers_entry() {
        let config = parse(
            r#"{
                "common_parameters": {
                    "base_url": "https://x",
                    "api_key_header": "X-Custom-Key",
                    "headers": {"api_key_header": "x-api-key"}
                },
                "ohlcv_requests": [{"name": "a", "endpoint": "/x"}]
            }"#,
        );
        assert_eq!(config.common_parameters.api_key_header(), "X-Custom-Key");
        assert_eq!(config.common_parameters.extra_headers().count(), 0);
    }

    #[test]
    fn test_unnamed_request_named_after_endpoint() {
        let config = parse(
            r#"{
                "common_parameters": {"base_url": "https://x"},
                "ohlcv_requests": [{"endpoint": "/defi/ohlcv/pair"}]
            }"#,
        );
        assert_eq!(config.ohlcv_requests[0].name, "defi_ohlcv_pair");
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        let cases = [
            r#"{"common_parameters": {"base_url": ""}, "ohlcv_requests": [{"name": "a", "endpoint": "/x"}]}"#,
            r#"{"common_parameters": {"base_url": "https://x"}, "ohlcv_requests": []}"#,
            r#"{"common_parameters": {"base_url": "https://x"}, "ohlcv_requests": [{"name": "a"}]}"#,
            r#"{"common_parameters": {"base_url": "https://x"}, "ohlcv_requests": [{"name": "a", "endpoint": "/x"}, {"name": "a", "endpoint": "/y"}]}"#,
            r#"{"common_parameters": {"base_url": "https://x"}, "ohlcv_requests": [{"name": "../a", "endpoint": "/x"}]}"#,
        ];
        for json in cases {
            let err = parse(json).validate().unwrap_err();
            assert!(matches!(err, SetupError::InvalidConfig(_)), "{}", json);
        }
    }

    #[test]
    fn test_from_file_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = Config::from_file(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, SetupError::ConfigRead { .. }));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        let err = Config::from_file(&bad).unwrap_err();
        assert!(matches!(err, SetupError::ConfigParse { .. }));

        let good = dir.path().join("good.json");
        fs::write(&good, SAMPLE).unwrap();
        assert_eq!(Config::from_file(&good).unwrap().ohlcv_requests.len(), 2);
    }

    #[test]
    fn test_credentials_reject_placeholder() {
        assert!(Credentials::new("").is_err());
        assert!(Credentials::new("   ").is_err());
        assert!(Credentials::new(PLACEHOLDER_API_KEY).is_err());
        assert_eq!(Credentials::new(" abc ").unwrap().api_key(), "abc");
    }

    fn write_env(dir: &tempfile::TempDir, lines: &[&str]) -> std::path::PathBuf {
        let path = dir.path().join(".env");
        let mut file = fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    #[test]
    fn test_credentials_from_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_env(&dir, &["# birdeye", "OTHER=1", "BIRDEYE_API_KEY=file-key"]);

        let credentials = Credentials::resolve(None, &path).unwrap();
        assert_eq!(credentials.api_key(), "file-key");
    }

    #[test]
    fn test_exported_key_wins_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_env(&dir, &["BIRDEYE_API_KEY=file-key"]);

        let credentials = Credentials::resolve(Some("env-key".to_string()), &path).unwrap();
        assert_eq!(credentials.api_key(), "env-key");
    }

    #[test]
    fn test_exported_key_used_when_file_holds_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_env(&dir, &["BIRDEYE_API_KEY=YOUR_API_KEY_HERE"]);

        let credentials = Credentials::resolve(Some("env-key".to_string()), &path).unwrap();
        assert_eq!(credentials.api_key(), "env-key");

        let err = Credentials::resolve(None, &path).unwrap_err();
        assert!(matches!(err, SetupError::MissingApiKey(_)));
    }

    #[test]
    fn test_placeholder_export_falls_back_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_env(&dir, &["BIRDEYE_API_KEY=file-key"]);

        let credentials =
            Credentials::resolve(Some(PLACEHOLDER_API_KEY.to_string()), &path).unwrap();
        assert_eq!(credentials.api_key(), "file-key");
    }

    #[test]
    fn test_missing_file_and_env_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Credentials::resolve(None, &dir.path().join("absent.env")).unwrap_err();
        assert!(matches!(err, SetupError::MissingApiKey(_)));
    }

    #[test]
    fn test_unparsable_env_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_env(&dir, &["this line has no equals", "BIRDEYE_API_KEY=file-key"]);

        assert_eq!(read_env_file_key(&path).as_deref(), Some("file-key"));
    }

    #[test]
    fn test_credentials_debug_redacts_key() {
        let credentials = Credentials::new("super-secret").unwrap();
        let printed = format!("{:?}", credentials);
        assert!(!printed.contains("super-secret"));
    }
}
