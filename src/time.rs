//! Time conversion between operator-supplied strings and unix seconds
//!
//! All times are UTC. Inputs are tried in this order:
//! - `YYYY-MM-DD HH:MM:SS`
//! - ISO 8601 / RFC 3339 with an offset or trailing `Z`
//! - ISO 8601 without an offset (`YYYY-MM-DDTHH:MM[:SS[.fff]]`), taken as UTC
//! - a bare date (`YYYY-MM-DD`), taken as midnight UTC

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use thiserror::Error;

/// Canonical input and display format
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ISO_NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const ISO_MINUTES_FORMAT: &str = "%Y-%m-%dT%H:%M";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Input matched none of the accepted time formats
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid time '{input}': expected 'YYYY-MM-DD HH:MM:SS' or ISO 8601 (e.g. '2025-04-13T18:00:00Z')")]
pub struct TimeFormatError {
    pub input: String,
}

/// Parse a UTC time string into unix seconds
///
/// Fractional seconds are truncated.
pub fn parse_timestamp(text: &str) -> Result<i64, TimeFormatError> {
    let trimmed = text.trim();

    NaiveDateTime::parse_from_str(trimmed, CANONICAL_FORMAT)
        .map(naive_to_unix)
        .or_else(|_| parse_iso(trimmed))
        .map_err(|_| TimeFormatError {
            input: text.to_string(),
        })
}

fn parse_iso(text: &str) -> Result<i64, chrono::ParseError> {
    text.parse::<DateTime<Utc>>()
        .map(|dt| dt.timestamp())
        .or_else(|_| NaiveDateTime::parse_from_str(text, ISO_NAIVE_FORMAT).map(naive_to_unix))
        .or_else(|_| NaiveDateTime::parse_from_str(text, ISO_MINUTES_FORMAT).map(naive_to_unix))
        .or_else(|_| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .map(|date| naive_to_unix(date.and_time(NaiveTime::MIN)))
        })
}

fn naive_to_unix(ndt: NaiveDateTime) -> i64 {
    DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc).timestamp()
}

/// Render unix seconds as `YYYY-MM-DD HH:MM:SS` (UTC)
///
/// Timestamps chrono cannot represent are rendered as the raw number.
pub fn format_timestamp(unix: i64) -> String {
    match DateTime::from_timestamp(unix, 0) {
        Some(dt) => dt.format(CANONICAL_FORMAT).to_string(),
        None => unix.to_string(),
    }
}
