//! Schedule locations and the Tiploc reference records they point at.

use serde::{Deserialize, Serialize};

/// One stop (or timing point) in a schedule's itinerary.
///
/// Locations are owned by their schedule and kept in itinerary order. The
/// Tiploc code is only a reference; descriptions are looked up at query
/// time, never copied in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleLocation {
    pub location_type: String,
    pub record_identity: String,
    pub tiploc_code: String,
    pub tiploc_instance: String,
    /// Scheduled (working timetable) departure clock string.
    pub departure: String,
    pub public_departure: String,
    pub platform: String,
    pub line: String,
    pub engineering_allowance: String,
    pub pathing_allowance: String,
    pub performance_allowance: String,
    /// Scheduled (working timetable) arrival clock string.
    pub arrival: String,
    pub public_arrival: String,
    pub pass: String,
    pub path: String,
}

impl ScheduleLocation {
    /// Where the train starts: `LO` in the full feed, `TB` in VSTP.
    pub fn is_origin(&self) -> bool {
        matches!(self.record_identity.trim(), "LO" | "TB")
    }

    /// Where the train terminates: `LT` in the full feed, `TF` in VSTP.
    pub fn is_destination(&self) -> bool {
        matches!(self.record_identity.trim(), "LT" | "TF")
    }
}

/// A timing point location reference (TIPLOC).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tiploc {
    pub transaction_type: String,
    pub tiploc_code: String,
    pub nalco: String,
    pub stanox: String,
    pub crs_code: String,
    pub description: String,
    pub tps_description: String,
}
