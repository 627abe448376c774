//! Publication timestamps.
//!
//! Front-matter dates come in three shapes:
//!
//! | Input                       | Interpreted as           |
//! |-----------------------------|--------------------------|
//! | `2024-06-01`                | midnight UTC             |
//! | `2024-06-01T08:30:00`       | that wall time in UTC    |
//! | `2024-06-01T08:30:00+02:00` | RFC 3339, converted to UTC |

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid date `{0}`, expected YYYY-MM-DD or RFC 3339")]
pub struct DateError(pub String);

/// Parse a front-matter timestamp into UTC.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, DateError> {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if s.len() == 10
        && let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        && let Some(naive) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(naive.and_utc());
    }

    Err(DateError(input.to_owned()))
}

/// Human-readable form used in post listings: `Jun 1, 2024`.
pub fn format_date(dt: &DateTime<Utc>) -> String {
    dt.format("%b %-d, %Y").to_string()
}

/// `YYYY-MM-DD`, as expected by `<lastmod>`.
pub fn format_ymd(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_plain_date() {
        let dt = parse_timestamp("2024-06-01").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 6, 1));
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn test_parse_naive_datetime() {
        let dt = parse_timestamp("2024-06-01T08:30:15").unwrap();
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (8, 30, 15));
    }

    #[test]
    fn test_parse_rfc3339_converts_to_utc() {
        let dt = parse_timestamp("2024-06-01T08:30:00+02:00").unwrap();
        assert_eq!(dt.hour(), 6);

        let z = parse_timestamp("2024-06-01T08:30:00Z").unwrap();
        assert_eq!(z.hour(), 8);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert!(parse_timestamp("  2024-01-01 ").is_ok());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(
            parse_timestamp("yesterday"),
            Err(DateError("yesterday".into()))
        );
        assert!(parse_timestamp("2024-13-01").is_err());
        assert!(parse_timestamp("2023-02-29").is_err());
        assert!(parse_timestamp("").is_err());
    }

    #[test]
    fn test_parse_leap_day() {
        assert!(parse_timestamp("2024-02-29").is_ok());
    }

    #[test]
    fn test_format_date() {
        let dt = parse_timestamp("2024-06-01").unwrap();
        assert_eq!(format_date(&dt), "Jun 1, 2024");

        let dt = parse_timestamp("2023-12-25").unwrap();
        assert_eq!(format_date(&dt), "Dec 25, 2023");
    }

    #[test]
    fn test_format_ymd() {
        let dt = parse_timestamp("2024-01-05T23:59:59Z").unwrap();
        assert_eq!(format_ymd(&dt), "2024-01-05");
    }

    #[test]
    fn test_ordering_follows_time() {
        let a = parse_timestamp("2024-01-01").unwrap();
        let b = parse_timestamp("2024-06-01").unwrap();
        assert!(b > a);
    }
}
