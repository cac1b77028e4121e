//! Time ranges and range chunking
//!
//! A request window that exceeds the per-request span is split into
//! consecutive chunks. Consecutive chunks never share a second: chunk `i + 1`
//! starts one second after chunk `i` ends, and the last chunk always ends at
//! the requested end.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::warn;

use crate::error::SetupError;
use crate::time::{format_timestamp, parse_timestamp};

/// Span used when a non-positive chunk size is requested
pub const DEFAULT_CHUNK_HOURS: i64 = 24;

const SECONDS_PER_HOUR: i64 = 3600;

/// `start > end` passed to [`TimeRange::new`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("start time {start} is after end time {end}")]
pub struct InvalidRangeError {
    pub start: i64,
    pub end: i64,
}

/// Closed interval `[start, end]` in unix seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    start: i64,
    end: i64,
}

impl TimeRange {
    /// Create a range, rejecting `start > end`
    pub fn new(start: i64, end: i64) -> Result<Self, InvalidRangeError> {
        if start > end {
            return Err(InvalidRangeError { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    /// Length in seconds (`end - start`)
    pub fn duration_secs(&self) -> i64 {
        self.end - self.start
    }

    pub fn duration_hours(&self) -> f64 {
        self.duration_secs() as f64 / SECONDS_PER_HOUR as f64
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            format_timestamp(self.start),
            format_timestamp(self.end)
        )
    }
}

/// Parse operator-supplied start and end times into a range
pub fn parse_range(start: &str, end: &str) -> Result<TimeRange, SetupError> {
    let start = parse_timestamp(start)?;
    let end = parse_timestamp(end)?;
    Ok(TimeRange::new(start, end)?)
}

/// Ordered, non-overlapping chunks covering one [`TimeRange`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    chunks: Vec<TimeRange>,
    max_chunk_hours: i64,
}

impl ChunkPlan {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimeRange> {
        self.chunks.iter()
    }

    pub fn as_slice(&self) -> &[TimeRange] {
        &self.chunks
    }

    /// Chunk size the plan was built with, after defaulting
    pub fn max_chunk_hours(&self) -> i64 {
        self.max_chunk_hours
    }

    /// Seconds between the first chunk's start and the last chunk's end
    pub fn total_secs(&self) -> i64 {
        match (self.chunks.first(), self.chunks.last()) {
            (Some(first), Some(last)) => last.end - first.start,
            _ => 0,
        }
    }
}

impl<'a> IntoIterator for &'a ChunkPlan {
    type Item = &'a TimeRange;
    type IntoIter = std::slice::Iter<'a, TimeRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

/// Split `range` into chunks no longer than `max_chunk_hours`
///
/// A range that already fits is returned as a single chunk. Otherwise the
/// duration is divided into `ceil(duration / max)` equal widths; each
/// boundary is floored to a whole second and the last chunk is pinned to
/// `range.end()`. `max_chunk_hours <= 0` falls back to
/// [`DEFAULT_CHUNK_HOURS`].
pub fn chunk_time_range(range: TimeRange, max_chunk_hours: i64) -> ChunkPlan {
    let max_chunk_hours = if max_chunk_hours <= 0 {
        warn!(
            "Invalid chunk size {}h, using {}h",
            max_chunk_hours, DEFAULT_CHUNK_HOURS
        );
        DEFAULT_CHUNK_HOURS
    } else {
        max_chunk_hours
    };

    let max_secs = max_chunk_hours.saturating_mul(SECONDS_PER_HOUR);
    let duration = range.duration_secs();

    if duration <= max_secs {
        return ChunkPlan {
            chunks: vec![range],
            max_chunk_hours,
        };
    }

    // duration > max_secs >= 3600, so each width is well above one second
    let count = (duration + max_secs - 1) / max_secs;
    let mut chunks = Vec::with_capacity(count as usize);
    let mut current_start = range.start;

    for i in 1..=count {
        let end = if i == count {
            range.end
        } else {
            // floor(start + i * duration / count), exact in integer math
            range.start + ((i as i128 * duration as i128) / count as i128) as i64
        };
        chunks.push(TimeRange {
            start: current_start,
            end,
        });
        current_start = end + 1;
    }

    ChunkPlan {
        chunks,
        max_chunk_hours,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: i64, end: i64) -> TimeRange {
        TimeRange::new(start, end).unwrap()
    }

    fn assert_plan_invariants(input: TimeRange, plan: &ChunkPlan) {
        let max_secs = plan.max_chunk_hours() * SECONDS_PER_HOUR;
        let chunks = plan.as_slice();

        assert!(!chunks.is_empty());
        assert_eq!(chunks[0].start(), input.start());
        assert_eq!(chunks[chunks.len() - 1].end(), input.end());

        for chunk in chunks {
            assert!(chunk.start() <= chunk.end(), "empty chunk {:?}", chunk);
            assert!(chunk.duration_secs() <= max_secs + 1, "oversized {:?}", chunk);
        }
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].start(), pair[0].end() + 1, "gap or overlap");
        }
    }

    #[test]
    fn test_time_range_rejects_reversed_bounds() {
        let err = TimeRange::new(10, 5).unwrap_err();
        assert_eq!(err, InvalidRangeError { start: 10, end: 5 });
        assert!(TimeRange::new(5, 5).is_ok());
    }

    #[test]
    fn test_parse_range() {
        let parsed = parse_range("2025-04-13 00:00:00", "2025-04-13T18:00:00Z").unwrap();
        assert_eq!(parsed, range(1744502400, 1744567200));

        let reversed = parse_range("2025-04-14 00:00:00", "2025-04-13 00:00:00").unwrap_err();
        assert!(matches!(reversed, SetupError::InvalidRange(_)));

        let garbage = parse_range("soon", "2025-04-13 00:00:00").unwrap_err();
        assert!(matches!(garbage, SetupError::Time(_)));
    }

    #[test]
    fn test_short_range_is_single_chunk() {
        let input = range(1_000, 1_000 + 3 * 3600);
        let plan = chunk_time_range(input, 24);
        assert_eq!(plan.as_slice(), &[input]);
    }

    #[test]
    fn test_exact_max_span_is_single_chunk() {
        let input = range(0, 24 * 3600);
        let plan = chunk_time_range(input, 24);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.as_slice()[0], input);
    }

    #[test]
    fn test_zero_length_range() {
        let input = range(42, 42);
        let plan = chunk_time_range(input, 1);
        assert_eq!(plan.as_slice(), &[input]);
        assert_eq!(plan.total_secs(), 0);
    }

    #[test]
    fn test_thirty_hour_window_splits_in_two() {
        let start = parse_timestamp("2025-04-13 00:00:00").unwrap();
        let end = parse_timestamp("2025-04-14 06:00:00").unwrap();
        let input = range(start, end);

        let plan = chunk_time_range(input, 24);

        assert_eq!(plan.len(), 2);
        let first = plan.as_slice()[0];
        let second = plan.as_slice()[1];
        assert!(first.duration_secs() <= 24 * 3600);
        assert_eq!(first.end(), start + 15 * 3600);
        assert_eq!(second.start(), first.end() + 1);
        assert_eq!(second.end(), end);
        assert_plan_invariants(input, &plan);
    }

    #[test]
    fn test_non_positive_chunk_hours_defaults_to_24() {
        let input = range(0, 72 * 3600);
        let zero = chunk_time_range(input, 0);
        let negative = chunk_time_range(input, -5);

        assert_eq!(zero.max_chunk_hours(), DEFAULT_CHUNK_HOURS);
        assert_eq!(zero, negative);
        assert_eq!(zero.len(), 3);
        assert_plan_invariants(input, &zero);
    }

    #[test]
    fn test_uneven_division_floors_boundaries() {
        // 10 hours + 7 seconds into 1 hour chunks -> 11 chunks
        let input = range(100, 100 + 10 * 3600 + 7);
        let plan = chunk_time_range(input, 1);
        assert_eq!(plan.len(), 11);
        assert_plan_invariants(input, &plan);
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let input = range(1_700_000_000, 1_700_000_000 + 500_000);
        assert_eq!(chunk_time_range(input, 7), chunk_time_range(input, 7));
    }

    #[test]
    fn test_invariants_hold_across_spans() {
        let starts = [0_i64, 1, 1_744_502_400, 1_744_502_399];
        let durations = [1_i64, 3599, 3600, 3601, 86_399, 86_400, 86_401, 250_007, 2_592_000];
        for &start in &starts {
            for &duration in &durations {
                for hours in [1_i64, 2, 5, 24, 168] {
                    let input = range(start, start + duration);
                    let plan = chunk_time_range(input, hours);
                    assert_plan_invariants(input, &plan);
                    if duration <= hours * 3600 {
                        assert_eq!(plan.len(), 1);
                    }
                }
            }
        }
    }
}
