//! Canonical schedule model.
//!
//! Both ingestion sources (the full-snapshot feed and the VSTP stream) are
//! translated into these types. The derived fields of a [`Schedule`] are
//! always recomputed by [`Schedule::augment`], so code that receives a
//! schedule from the store can trust them.

pub mod codes;
mod days;
mod location;
mod operator;
mod schedule;
mod source;
mod stp;
mod time;
mod timetable;

pub use days::DaysRun;
pub use location::{ScheduleLocation, Tiploc};
pub use operator::operator_name;
pub use schedule::{Schedule, combined_key};
pub use source::{Source, SourceLabel};
pub use stp::{InvalidStpIndicator, StpIndicator};
pub use time::{
    ClockTime, SECONDS_PER_DAY, TimeError, combine_date_and_clock, end_of_day_ts, parse_cif_date,
    start_of_day_ts,
};
pub use timetable::{Timetable, TimetableMetadata, TimetableSender};
