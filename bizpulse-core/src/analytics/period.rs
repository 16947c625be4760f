//! Calendar bucketing and the shared zero-value arithmetic policy
//!
//! Every ratio in the analytics views goes through [`percent`], [`ratio`] or
//! [`percent_change`], which resolve a zero denominator to `0.0`.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    pub year: i32,
    /// 1-12
    pub month: u32,
}

impl Month {
    pub fn of(ts: DateTime<Utc>) -> Self {
        Self {
            year: ts.year(),
            month: ts.month(),
        }
    }

    /// The month before this one.
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Month {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Month {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Sortable key, e.g. "2024-03".
    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        Month::of(ts) == *self
    }
}

/// "YYYY-MM" of a timestamp.
pub fn month_key(ts: DateTime<Utc>) -> String {
    Month::of(ts).key()
}

/// "YYYY-MM-DD" of a timestamp.
pub fn date_key(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// ISO-8601 week key, e.g. "2021-W53".
///
/// The year is the ISO week-numbering year (the year holding the week's
/// Thursday), which can differ from the calendar year around New Year.
pub fn iso_week_key(ts: DateTime<Utc>) -> String {
    let week = ts.iso_week();
    format!("{:04}-W{:02}", week.year(), week.week())
}

/// Calendar quarter (1-4) of a month number.
pub fn quarter_of(month: u32) -> u8 {
    (((month.clamp(1, 12) - 1) / 3) + 1) as u8
}

/// Whole-day calendar date of a timestamp.
pub fn date_of(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

/// Elapsed days between two timestamps, fractional.
pub fn days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    end.signed_duration_since(start).num_seconds() as f64 / 86_400.0
}

/// `part / whole * 100`, or 0 when `whole` is 0.
pub fn percent(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

/// `numerator / denominator`, or 0 when `denominator` is 0.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Percent change from `previous` to `current`, or 0 when `previous` is 0.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_month_previous_wraps_year() {
        let jan = Month { year: 2024, month: 1 };
        assert_eq!(jan.previous(), Month { year: 2023, month: 12 });
        assert_eq!(jan.key(), "2024-01");
    }

    #[test]
    fn test_iso_week_key_uses_week_year() {
        // Jan 1 2021 is a Friday: it belongs to week 53 of 2020
        assert_eq!(iso_week_key(at(2021, 1, 1)), "2020-W53");
        // Dec 31 2024 is a Tuesday: week 1 of 2025
        assert_eq!(iso_week_key(at(2024, 12, 31)), "2025-W01");
        assert_eq!(iso_week_key(at(2024, 3, 6)), "2024-W10");
    }

    #[test]
    fn test_quarter_of() {
        assert_eq!(quarter_of(1), 1);
        assert_eq!(quarter_of(3), 1);
        assert_eq!(quarter_of(4), 2);
        assert_eq!(quarter_of(9), 3);
        assert_eq!(quarter_of(12), 4);
    }

    #[test]
    fn test_zero_denominators() {
        assert_eq!(percent(5.0, 0.0), 0.0);
        assert_eq!(ratio(5.0, 0.0), 0.0);
        assert_eq!(percent_change(5.0, 0.0), 0.0);
        assert_eq!(percent_change(1500.0, 1000.0), 50.0);
        assert_eq!(percent_change(800.0, 1000.0), -20.0);
    }

    #[test]
    fn test_keys() {
        assert_eq!(month_key(at(2024, 7, 4)), "2024-07");
        assert_eq!(date_key(at(2024, 7, 4)), "2024-07-04");
        assert_eq!(days_between(at(2024, 7, 1), at(2024, 7, 4)), 3.0);
    }
}
