//! CIF date and clock handling.
//!
//! Schedule validity is given as `YYYY-MM-DD` calendar dates and each stop
//! carries only a wall-clock string (`HHMM`, `HHMMSS`, or `HHMMH` for a
//! half minute). This module turns those into Unix timestamps. All dates are
//! interpreted in UTC so that stored validity bounds and query days always
//! line up.

use chrono::{NaiveDate, NaiveTime};

/// Seconds in one day; also the midnight-crossing correction.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Error returned when parsing an invalid date or clock string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Parse a CIF `YYYY-MM-DD` date.
pub fn parse_cif_date(s: &str) -> Result<NaiveDate, TimeError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| TimeError::new("expected YYYY-MM-DD date"))
}

/// Unix timestamp of `00:00:00` on `date`.
pub fn start_of_day_ts(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Unix timestamp of `23:59:59` on `date`.
pub fn end_of_day_ts(date: NaiveDate) -> i64 {
    start_of_day_ts(date) + SECONDS_PER_DAY - 1
}

/// A wall-clock time of day taken from a schedule location.
///
/// # Examples
///
/// ```
/// use schedule_server::domain::ClockTime;
///
/// assert_eq!(ClockTime::parse("0756").unwrap().seconds_from_midnight(), 7 * 3600 + 56 * 60);
/// assert!(ClockTime::parse("235600").is_ok());
/// assert!(ClockTime::parse("0756H").is_ok());
/// assert!(ClockTime::parse("2460").is_err());
/// assert!(ClockTime::parse("").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClockTime {
    hour: u32,
    minute: u32,
}

impl ClockTime {
    /// Parse the leading `HHMM` of a clock string.
    ///
    /// Trailing seconds or a half-minute marker are accepted and ignored.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let s = s.trim();
        if s.len() < 4 {
            return Err(TimeError::new("expected at least HHMM"));
        }

        let bytes = s.as_bytes();
        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }

        let minute = parse_two_digits(&bytes[2..4])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn seconds_from_midnight(&self) -> i64 {
        i64::from(self.hour * 3600 + self.minute * 60)
    }
}

/// Combine a calendar date with a clock string into a Unix timestamp.
pub fn combine_date_and_clock(date: NaiveDate, clock: &str) -> Result<i64, TimeError> {
    let clock = ClockTime::parse(clock)?;
    Ok(start_of_day_ts(date) + clock.seconds_from_midnight())
}

/// Parse exactly two ASCII digits.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    match bytes {
        [a, b] if a.is_ascii_digit() && b.is_ascii_digit() => {
            Some(u32::from(a - b'0') * 10 + u32::from(b - b'0'))
        }
        _ => None,
    }
}
