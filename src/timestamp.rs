//! ISO-8601 timestamp parsing
//!
//! The tracker API mixes full RFC 3339 date-times (`createdAt`, `spentAt`)
//! with bare dates (`startDate`, `dueDate`). Bare dates are taken as midnight
//! UTC so both kinds compare on one timeline.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// A parsed instant on the UTC timeline
pub type Timestamp = DateTime<Utc>;

/// Parse an ISO-8601 string into a UTC instant
///
/// Accepts RFC 3339 (`2024-01-05T10:00:00Z`, `2024-01-05T10:00:00+02:00`),
/// a zone-less date-time (treated as UTC) and a bare date.
///
/// # Example
/// ```
/// use sprintlens::timestamp::parse_timestamp;
///
/// let date = parse_timestamp("2024-01-01").unwrap();
/// let time = parse_timestamp("2024-01-01T00:00:00Z").unwrap();
/// assert_eq!(date, time);
/// assert!(parse_timestamp("yesterday").is_none());
/// ```
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse an optional field, distinguishing "absent" from "unparseable"
///
/// Returns `Ok(None)` for a missing or blank value and `Err(raw)` when a
/// value is present but not a timestamp.
pub fn parse_optional(raw: Option<&str>) -> Result<Option<Timestamp>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_timestamp(value)
            .map(Some)
            .ok_or_else(|| value.to_string()),
    }
}

/// Hours between two instants, as a float
pub fn hours_between(start: Timestamp, end: Timestamp) -> f64 {
    (end - start).num_milliseconds() as f64 / 3_600_000.0
}
