//! ISO-8601 timestamp parsing shared by every stage of the engine
//!
//! Billing exports are inconsistent about offsets: some carry `Z`, some an
//! explicit `+00:00`, some nothing at all. Everything is normalized to UTC
//! here so no other module has to care.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Parse an ISO-8601 timestamp into UTC.
///
/// Accepted forms, tried in order:
/// - RFC 3339 with `Z` or a numeric offset (`2024-03-01T12:00:00+02:00`)
/// - naive date-time, taken as UTC (`2024-03-01T12:00:00`, `2024-03-01 12:00:00`)
/// - bare date, at midnight UTC (`2024-03-01`)
///
/// Returns `None` for anything else; callers skip such records.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
