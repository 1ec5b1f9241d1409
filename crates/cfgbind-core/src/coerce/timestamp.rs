//! Timestamp literals

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Layouts tried in order after RFC3339
const DATE_TIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_LAYOUT: &str = "%Y-%m-%d";
const RFC3339_NANOS_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";

/// Parse a timestamp literal
///
/// Layouts are tried in order: RFC3339, RFC3339 with fractional seconds,
/// `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DD`. The last two carry no offset and
/// are read as UTC.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, String> {
    let s = input.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(s, RFC3339_NANOS_LAYOUT) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, DATE_TIME_LAYOUT) {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, DATE_LAYOUT) {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(format!(
        "expected RFC3339, \"{}\" or \"{}\" layout",
        DATE_TIME_LAYOUT, DATE_LAYOUT
    ))
}
