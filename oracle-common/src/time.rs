//! Timestamp utilities
//!
//! Timestamps are stored as RFC 3339 text. Indexer timestamps arrive as unix
//! seconds where `0` means "not recorded".

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert unix seconds to a UTC timestamp
///
/// Returns `None` for zero, negative or out-of-range values.
pub fn from_unix_seconds(seconds: i64) -> Option<DateTime<Utc>> {
    if seconds <= 0 {
        return None;
    }
    Utc.timestamp_opt(seconds, 0).single()
}

/// Parse a stored timestamp
///
/// Accepts RFC 3339 (with `Z` or an explicit offset) and offset-less ISO 8601
/// forms, which are taken to be UTC. Returns `None` when nothing matches.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    None
}

/// Whole days elapsed between `registered_at` and `now`
///
/// Missing or unparsable timestamps count as age 0, as do timestamps in the future.
pub fn age_in_days(registered_at: Option<&str>, now: DateTime<Utc>) -> i64 {
    registered_at
        .and_then(parse_timestamp)
        .map(|registered| (now - registered).num_days().max(0))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
    }

    #[test]
    fn test_from_unix_seconds_zero_is_none() {
        assert!(from_unix_seconds(0).is_none());
        assert!(from_unix_seconds(-5).is_none());
    }

    #[test]
    fn test_from_unix_seconds_value() {
        let dt = from_unix_seconds(1_700_000_000).unwrap();
        assert_eq!(dt.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_parse_rfc3339_with_z() {
        let dt = parse_timestamp("2025-01-15T12:00:00Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-01-15T12:00:00+00:00");
    }

    #[test]
    fn test_parse_with_offset_normalizes_to_utc() {
        let dt = parse_timestamp("2025-01-15T14:00:00+02:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-01-15T12:00:00+00:00");
    }

    #[test]
    fn test_parse_naive_is_utc() {
        let dt = parse_timestamp("2025-01-15T12:00:00.250").unwrap();
        assert_eq!(dt.timestamp(), 1_736_942_400);
        assert!(parse_timestamp("2025-01-15 12:00:00").is_some());
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_age_in_days() {
        let now = parse_timestamp("2025-03-01T00:00:00Z").unwrap();
        let registered = (now - Duration::days(40) - Duration::hours(3)).to_rfc3339();
        assert_eq!(age_in_days(Some(&registered), now), 40);
    }

    #[test]
    fn test_age_in_days_defaults_to_zero() {
        let now = now();
        assert_eq!(age_in_days(None, now), 0);
        assert_eq!(age_in_days(Some("not a date"), now), 0);

        let future = (now + Duration::days(3)).to_rfc3339();
        assert_eq!(age_in_days(Some(&future), now), 0);
    }
}
