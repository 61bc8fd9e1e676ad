//! Days-run bitmask.

use std::fmt;

use chrono::Weekday;

/// The seven-flag "days run" mask of a schedule, Monday first.
///
/// `"1111100"` runs Monday to Friday; `"0000001"` runs on Sundays only.
///
/// # Examples
///
/// ```
/// use chrono::Weekday;
/// use schedule_server::domain::DaysRun;
///
/// let sundays = DaysRun::parse("0000001").unwrap();
/// assert!(sundays.runs_on(Weekday::Sun));
/// assert!(!sundays.runs_on(Weekday::Sat));
///
/// assert!(DaysRun::parse("000000").is_none());
/// assert!(DaysRun::parse("00000x0").is_none());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DaysRun(u8);

impl DaysRun {
    /// Parse a mask of exactly seven `0`/`1` characters.
    ///
    /// Returns `None` for anything else; a schedule with a malformed mask
    /// simply never matches a day.
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 7 {
            return None;
        }

        let mut bits = 0u8;
        for (i, b) in bytes.iter().enumerate() {
            match b {
                b'1' => bits |= 1 << i,
                b'0' => {}
                _ => return None,
            }
        }
        Some(DaysRun(bits))
    }

    /// Whether the flag for `day` is set.
    pub fn runs_on(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }
}

impl fmt::Debug for DaysRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DaysRun({self})")
    }
}

impl fmt::Display for DaysRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..7 {
            f.write_str(if self.0 & (1 << i) != 0 { "1" } else { "0" })?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    const DAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    proptest! {
        /// A single-day mask matches that day and no other
        #[test]
        fn single_day_gating(day in 0usize..7) {
            let mut chars = ['0'; 7];
            chars[day] = '1';
            let s: String = chars.iter().collect();
            let mask = DaysRun::parse(&s).unwrap();
            for (i, weekday) in DAYS.iter().enumerate() {
                prop_assert_eq!(mask.runs_on(*weekday), i == day);
            }
        }

        /// Any valid mask displays as itself
        #[test]
        fn roundtrip(s in "[01]{7}") {
            prop_assert_eq!(DaysRun::parse(&s).unwrap().to_string(), s);
        }
    }
}
