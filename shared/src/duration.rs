//! Elapsed time between two timestamps (MBRT test duration)

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{CoreError, CoreResult};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Parse a full timestamp or a bare time of day.
///
/// Bare times are anchored to a common date so two of them can be compared.
pub fn parse_timestamp(raw: &str) -> CoreResult<NaiveDateTime> {
    let raw = raw.trim();
    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(ts);
        }
    }
    for format in TIME_FORMATS {
        if let Ok(time) = NaiveTime::parse_from_str(raw, format) {
            return Ok(NaiveDate::default().and_time(time));
        }
    }
    Err(CoreError::validation(format!("Invalid time value: {raw}")))
}

/// Seconds from `start` to `end`; an inverted range is rejected
pub fn elapsed_seconds(start: NaiveDateTime, end: NaiveDateTime) -> CoreResult<i64> {
    if end < start {
        return Err(CoreError::InvalidRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    Ok((end - start).num_seconds())
}

/// [`elapsed_seconds`] over the raw strings entered on the inspection form
pub fn elapsed_seconds_str(start: &str, end: &str) -> CoreResult<i64> {
    elapsed_seconds(parse_timestamp(start)?, parse_timestamp(end)?)
}

/// Render seconds as `HH:MM:SS`
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}:{:02}", seconds / 3600, (seconds % 3600) / 60, seconds % 60)
}
