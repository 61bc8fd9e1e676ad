//! Full-snapshot schedule feed.
//!
//! The feed is a newline-delimited JSON file. The first line is a metadata
//! header (`JsonTimetableV1`); every following line carries one schedule
//! (`JsonScheduleV1`), one location reference (`TiplocV1`), or a payload this
//! service ignores (associations, the `EOF` marker).

mod convert;
mod error;
mod types;

pub use convert::{FeedRecord, decode_line, to_schedule, to_tiploc};
pub(crate) use convert::parse_stp;
pub use error::FeedError;
pub use types::{
    FeedLocation, JsonScheduleV1, NewScheduleSegment, RawFeedLine, ScheduleSegment, TiplocV1,
};
