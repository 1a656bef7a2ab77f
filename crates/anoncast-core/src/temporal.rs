//! # Temporal Helpers
//!
//! Proof timestamps are unix seconds. Everything user-facing renders them
//! in UTC with millisecond precision and a `Z` suffix
//! (e.g., `2024-05-01T12:00:00.000Z`), the format feed clients already
//! parse.

use chrono::{DateTime, Utc};

/// Format string for user-facing timestamps.
const ISO8601_MILLIS: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Convert unix seconds to a UTC datetime, if representable.
pub fn datetime_from_unix(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

/// Render unix seconds as an ISO 8601 string with millisecond precision.
///
/// Returns `None` when the value lies outside chrono's representable range.
pub fn iso8601_from_unix(secs: i64) -> Option<String> {
    datetime_from_unix(secs).map(|dt| format_iso8601(&dt))
}

/// Render a UTC datetime with millisecond precision and `Z` suffix.
pub fn format_iso8601(dt: &DateTime<Utc>) -> String {
    dt.format(ISO8601_MILLIS).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_millis_and_z() {
        assert_eq!(
            iso8601_from_unix(1_714_564_800).as_deref(),
            Some("2024-05-01T12:00:00.000Z")
        );
    }

    #[test]
    fn epoch() {
        assert_eq!(
            iso8601_from_unix(0).as_deref(),
            Some("1970-01-01T00:00:00.000Z")
        );
    }

    #[test]
    fn out_of_range_is_none() {
        assert!(iso8601_from_unix(i64::MAX).is_none());
    }
}
