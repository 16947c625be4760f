//! Argument parsers shared by several subcommands.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Parse an RFC 3339 timestamp, "YYYY-MM-DD HH:MM", "YYYY-MM-DDTHH:MM" or a
/// bare date (midnight UTC).
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    parse_date_start(s).map_err(|_| format!("invalid date or time: {}", s))
}

/// A date as the first instant of that day.
pub fn parse_date_start(s: &str) -> Result<DateTime<Utc>, String> {
    let date = parse_date(s)?;
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| format!("invalid date: {}", s))
}

/// A date as the last second of that day, for inclusive range ends.
pub fn parse_date_end(s: &str) -> Result<DateTime<Utc>, String> {
    let date = parse_date(s)?;
    date.and_hms_opt(23, 59, 59)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| format!("invalid date: {}", s))
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| format!("expected YYYY-MM-DD, got {}", s))
}

/// Parse a non-negative amount (rates, budgets, hours).
pub fn parse_amount(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("not a number: {}", s))?;
    if value < 0.0 || !value.is_finite() {
        return Err(format!("must be a non-negative number: {}", s));
    }
    Ok(value)
}
