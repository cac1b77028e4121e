//! Birdeye API client for downloading historical OHLCV data
//! Requires an API key sent in a configurable header.

mod client;
mod error;
mod types;

pub use client::{
    build_query, BirdeyeClient, ChunkFetcher, ADDRESS_PARAM, TIME_FROM_PARAM, TIME_TO_PARAM,
};
pub use error::{FetchError, FetchResult};
pub use types::*;
