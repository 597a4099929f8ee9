//! Timestamps and the change-detection tolerance
//!
//! Remote timestamps carry the offset the server reported and local ones
//! are taken in UTC. Comparisons are offset-independent.

use std::time::SystemTime;

use chrono::{DateTime, Duration, FixedOffset, Utc};

use super::errors::DomainError;

/// Instant with sub-second precision and an explicit UTC offset.
pub type Timestamp = DateTime<FixedOffset>;

/// Differences shorter than this many seconds are treated as equal.
pub const CHANGE_TOLERANCE_SECS: i64 = 1;

/// Returns true if `a` is at least [`CHANGE_TOLERANCE_SECS`] later than `b`.
pub fn is_after(a: &Timestamp, b: &Timestamp) -> bool {
    a.signed_duration_since(*b) >= Duration::seconds(CHANGE_TOLERANCE_SECS)
}

/// Convert a filesystem mtime.
pub fn from_system_time(time: SystemTime) -> Timestamp {
    DateTime::<Utc>::from(time).fixed_offset()
}

/// Parse an RFC 3339 string, keeping its offset.
pub fn parse_rfc3339(value: &str) -> Result<Timestamp, DomainError> {
    DateTime::parse_from_rfc3339(value).map_err(|_| DomainError::InvalidTimestamp(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        parse_rfc3339(s).unwrap()
    }

    #[test]
    fn test_sub_second_difference_is_not_after() {
        let a = ts("2024-01-01T00:00:00.900Z");
        let b = ts("2024-01-01T00:00:00.000Z");
        assert!(!is_after(&a, &b));
    }

    #[test]
    fn test_exactly_one_second_is_after() {
        let a = ts("2024-01-01T00:00:01Z");
        let b = ts("2024-01-01T00:00:00Z");
        assert!(is_after(&a, &b));
        assert!(!is_after(&b, &a));
    }

    #[test]
    fn test_offsets_are_normalised() {
        let a = ts("2024-01-01T02:00:05+02:00");
        let b = ts("2024-01-01T00:00:00Z");
        assert!(is_after(&a, &b));
    }

    #[test]
    fn test_parse_preserves_offset() {
        let t = ts("2024-06-01T10:00:00.123+05:30");
        assert_eq!(t.offset().local_minus_utc(), 5 * 3600 + 30 * 60);
        assert_eq!(t.timestamp_subsec_millis(), 123);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(
            parse_rfc3339("yesterday"),
            Err(DomainError::InvalidTimestamp("yesterday".to_string()))
        );
    }

    #[test]
    fn test_from_system_time() {
        let t = from_system_time(SystemTime::UNIX_EPOCH);
        assert_eq!(t.timestamp(), 0);
    }
}
