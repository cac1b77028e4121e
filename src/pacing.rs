//! Request pacing between sequential API calls
//!
//! The Birdeye public tier allows 60 requests per minute. Pacing is
//! cooperative: the caller awaits [`PacingPolicy::pause`] before every request
//! except the first.

use std::future::Future;
use std::time::Duration;

use crate::error::SetupError;

/// Default delay between chunk requests (60 requests/minute)
pub const DEFAULT_DELAY_SECS: f64 = 1.0;

/// Decides how long to wait before the next request
pub trait PacingPolicy {
    /// Nominal wait, for logging
    fn interval(&self) -> Duration;

    /// Suspend until the next request may be sent
    fn pause(&self) -> impl Future<Output = ()> + Send;
}

/// Constant delay between requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedInterval {
    interval: Duration,
}

impl Default for FixedInterval {
    fn default() -> Self {
        Self::new(Duration::from_secs_f64(DEFAULT_DELAY_SECS))
    }
}

impl FixedInterval {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// No delay at all
    pub fn none() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Build from a seconds value as given on the command line
    pub fn from_secs_f64(secs: f64) -> Result<Self, SetupError> {
        Duration::try_from_secs_f64(secs)
            .map(Self::new)
            .map_err(|e| {
                SetupError::InvalidArgument(format!(
                    "rate limit sleep must be a non-negative number of seconds, got {} ({})",
                    secs, e
                ))
            })
    }

    /// Same policy with the interval multiplied by `factor`
    pub fn scaled(&self, factor: u32) -> Self {
        Self::new(self.interval.saturating_mul(factor))
    }
}

impl PacingPolicy for FixedInterval {
    fn interval(&self) -> Duration {
        self.interval
    }

    async fn pause(&self) {
        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
    }
}
