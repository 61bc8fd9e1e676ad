//! Field predicates over stored schedules.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::domain::{Schedule, Source, StpIndicator, end_of_day_ts, start_of_day_ts};

/// A calendar day as epoch bounds plus weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDay {
    pub date: NaiveDate,
    /// 00:00:00 on the day.
    pub start_ts: i64,
    /// 23:59:59 on the day.
    pub end_ts: i64,
    pub weekday: Weekday,
}

impl ServiceDay {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            start_ts: start_of_day_ts(date),
            end_ts: end_of_day_ts(date),
            weekday: date.weekday(),
        }
    }
}

/// Conjunction of optional predicates; an unset predicate matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleFilter {
    pub train_uid: Option<String>,
    pub signalling_id: Option<String>,
    /// Accepted STP indicators; empty accepts all.
    pub stp: Vec<StpIndicator>,
    /// Source the schedule was originally ingested from.
    pub source: Option<Source>,
    /// Validity must cover the whole day, and the days-run mask must include
    /// its weekday.
    pub day: Option<ServiceDay>,
    /// ATOC operator code.
    pub operator: Option<String>,
    /// Tiploc code the itinerary must call at or pass.
    pub location: Option<String>,
}

impl ScheduleFilter {
    pub fn for_train_uid(uid: impl Into<String>) -> Self {
        Self {
            train_uid: Some(uid.into()),
            ..Default::default()
        }
    }

    pub fn for_signalling_id(id: impl Into<String>) -> Self {
        Self {
            signalling_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn with_stp(mut self, stp: &[StpIndicator]) -> Self {
        self.stp = stp.to_vec();
        self
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn on_day(mut self, day: ServiceDay) -> Self {
        self.day = Some(day);
        self
    }

    pub fn with_operator(mut self, operator: Option<String>) -> Self {
        self.operator = operator;
        self
    }

    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }

    pub fn matches(&self, schedule: &Schedule) -> bool {
        if let Some(uid) = &self.train_uid
            && schedule.train_uid != *uid
        {
            return false;
        }
        if let Some(id) = &self.signalling_id
            && schedule.signalling_id != *id
        {
            return false;
        }
        if !self.stp.is_empty()
            && !schedule
                .stp_indicator
                .is_some_and(|stp| self.stp.contains(&stp))
        {
            return false;
        }
        if let Some(source) = self.source
            && schedule.source.origin() != Some(source)
        {
            return false;
        }
        if let Some(day) = &self.day {
            if !schedule.covers_day(day.start_ts, day.end_ts) {
                return false;
            }
            // A malformed mask never matches
            if !schedule.days_run().is_some_and(|d| d.runs_on(day.weekday)) {
                return false;
            }
        }
        if let Some(operator) = &self.operator
            && schedule.atoc_code != *operator
        {
            return false;
        }
        if let Some(location) = &self.location
            && !schedule.calls_at(location)
        {
            return false;
        }
        true
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// A day matches exactly when the mask has that weekday's flag set
        #[test]
        fn weekday_gating(mask in "[01]{7}", offset in 0i64..7) {
            // 2023-10-09 is a Monday
            let date = NaiveDate::from_ymd_opt(2023, 10, 9).unwrap() + chrono::Duration::days(offset);
            let mut s = Schedule {
                schedule_days_runs: mask.clone(),
                schedule_start_date: "2023-01-01".to_string(),
                schedule_end_date: "2023-12-31".to_string(),
                ..Default::default()
            };
            s.augment();
            let expected = mask.as_bytes()[offset as usize] == b'1';
            prop_assert_eq!(ScheduleFilter::default().on_day(ServiceDay::new(date)).matches(&s), expected);
        }
    }
}
