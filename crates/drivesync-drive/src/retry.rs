//! Retry policy for transient Drive failures
//!
//! Rate limiting (HTTP 429, or 403 with a rate-limit reason), server errors
//! and network failures are retried with exponential backoff. A
//! `Retry-After` header, when present, replaces the computed delay.

use std::time::Duration;

use tracing::warn;

/// Longest server-suggested wait that is honoured
const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// How often and how long to back off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further one
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Backoff before retry number `attempt` (0-based): base, 2x base, 4x base, ...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Parses a Retry-After header value into a Duration.
///
/// The header can be either:
/// - An integer number of seconds (e.g., "30")
/// - An HTTP-date (e.g., "Fri, 31 Dec 2025 23:59:59 GMT") - parsed as seconds from now
///
/// Returns `None` if the value is unusable.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds).min(MAX_RETRY_AFTER));
    }

    if let Ok(date) = chrono::DateTime::parse_from_rfc2822(value) {
        let wait = date.with_timezone(&chrono::Utc) - chrono::Utc::now();
        return Some(wait.to_std().unwrap_or(Duration::ZERO).min(MAX_RETRY_AFTER));
    }

    warn!(value, "Could not parse Retry-After header");
    None
}
