//! Origin, destination and journey-time enrichment.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::domain::{SECONDS_PER_DAY, Schedule, ScheduleLocation, combine_date_and_clock};

/// A resolved schedule with display fields for its end points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedSchedule {
    #[serde(flatten)]
    pub schedule: Schedule,
    /// Description of the origin location.
    pub origin: Option<String>,
    /// Description of the destination location.
    pub destination: Option<String>,
    pub time_of_departure_from_origin_ts: Option<i64>,
    pub time_of_arrival_at_destination_ts: Option<i64>,
}

/// First origin-type and first destination-type location of the itinerary.
pub fn endpoints(schedule: &Schedule) -> (Option<&ScheduleLocation>, Option<&ScheduleLocation>) {
    let origin = schedule.locations.iter().find(|l| l.is_origin());
    let destination = schedule.locations.iter().find(|l| l.is_destination());
    (origin, destination)
}

fn timestamp(date: NaiveDate, clock: &str, tiploc: &str) -> Option<i64> {
    match combine_date_and_clock(date, clock) {
        Ok(ts) => Some(ts),
        Err(e) => {
            debug!(%tiploc, clock, error = %e, "no usable time at end point");
            None
        }
    }
}

/// Departure and arrival timestamps on `date`.
///
/// Only clock times are recorded per stop, so an arrival earlier than the
/// departure is taken to be on the following day.
pub fn journey_times(schedule: &Schedule, date: NaiveDate) -> (Option<i64>, Option<i64>) {
    let (origin, destination) = endpoints(schedule);
    let departure = origin.and_then(|l| timestamp(date, &l.departure, &l.tiploc_code));
    let mut arrival = destination.and_then(|l| timestamp(date, &l.arrival, &l.tiploc_code));

    if let (Some(dep), Some(arr)) = (departure, arrival)
        && arr < dep
    {
        arrival = Some(arr + SECONDS_PER_DAY);
    }

    (departure, arrival)
}
