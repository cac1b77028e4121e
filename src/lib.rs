//! Birdeye OHLCV downloader
//!
//! Splits a requested time window into API-sized chunks, fetches each chunk
//! from the Birdeye API with fixed pacing between requests, merges the
//! results and writes one CSV per configured request.
//!
//! ```no_run
//! use birdeye_ohlcv::{chunk_time_range, BirdeyeClient, Config, Credentials, FixedInterval, Pipeline, TimeRange};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_file("default_config.json")?;
//!     let credentials = Credentials::from_env_file(".env")?;
//!     let client = BirdeyeClient::new(&config.common_parameters, &credentials)?;
//!
//!     let plan = chunk_time_range(TimeRange::new(1744502400, 1744610400)?, 24);
//!     let pipeline = Pipeline::with_fixed_delay(
//!         client,
//!         FixedInterval::default(),
//!         plan,
//!         config.default_token_address().map(str::to_string),
//!         "output_csv",
//!     );
//!     let summary = pipeline.run(&config.ohlcv_requests).await;
//!     println!("Saved {} files", summary.saved_count());
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod birdeye;
pub mod chunk;
pub mod config;
pub mod error;
pub mod output;
pub mod pacing;
pub mod pipeline;
pub mod time;

pub use aggregate::{aggregate, aggregate_with_report, AggregateReport};
pub use birdeye::{BirdeyeClient, ChunkFetcher, FetchError, Record};
pub use chunk::{chunk_time_range, parse_range, ChunkPlan, TimeRange};
pub use config::{Config, Credentials, RequestSpec};
pub use error::SetupError;
pub use output::{write_csv, PersistError};
pub use pacing::{FixedInterval, PacingPolicy};
pub use pipeline::{Pipeline, RunSummary, SpecOutcome};
pub use time::{format_timestamp, parse_timestamp, TimeFormatError};
