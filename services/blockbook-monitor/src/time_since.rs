//! Relative age formatting ("3 hours 12 mins ago")

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse an ISO 8601 timestamp as reported by Blockbook.
///
/// RFC 3339 with an offset is the usual form. Date-times without an offset
/// and bare dates are read as UTC.
pub fn parse_timestamp(timestamp: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(t.and_utc());
    }
    NaiveDate::parse_from_str(timestamp, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}

/// Format the age of `timestamp` relative to `now`.
///
/// Returns `None` when the timestamp cannot be parsed. Timestamps in the
/// future read as "just now".
pub fn time_since(timestamp: &str, now: DateTime<Utc>) -> Option<String> {
    let then = parse_timestamp(timestamp)?;
    Some(format_elapsed_ms((now - then).num_milliseconds()))
}

/// Format an elapsed duration given in milliseconds
pub fn format_elapsed_ms(elapsed_ms: i64) -> String {
    let minutes = elapsed_ms.div_euclid(60_000);
    let hours = minutes.div_euclid(60);
    let days = hours.div_euclid(24);

    if days > 0 {
        let hours = hours % 24;
        format!(
            "{} {} {} {} ago",
            days,
            plural(days, "day"),
            hours,
            plural(hours, "hour")
        )
    } else if hours > 0 {
        let minutes = minutes % 60;
        format!(
            "{} {} {} {} ago",
            hours,
            plural(hours, "hour"),
            minutes,
            plural(minutes, "min")
        )
    } else if minutes > 0 {
        format!("{} {} ago", minutes, plural(minutes, "minute"))
    } else {
        "just now".to_string()
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        unit.to_string()
    } else {
        format!("{}s", unit)
    }
}
