//! Full-snapshot feed DTOs.
//!
//! Each line of the feed file is one JSON object with a single top-level
//! key naming its payload. These types map the JSON directly. They use
//! `Option` liberally because the feed sends `null` for most unset fields.

use serde::Deserialize;

use crate::domain::Timetable;

/// One raw line of the feed, before classification.
///
/// Lines carrying other payloads (associations, the trailing `EOF` marker)
/// decode with every field `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFeedLine {
    #[serde(rename = "JsonTimetableV1")]
    pub timetable: Option<Timetable>,

    #[serde(rename = "JsonScheduleV1")]
    pub schedule: Option<JsonScheduleV1>,

    #[serde(rename = "TiplocV1")]
    pub tiploc: Option<TiplocV1>,
}

/// A location reference record from the full feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TiplocV1 {
    pub transaction_type: Option<String>,
    pub tiploc_code: Option<String>,
    pub nalco: Option<String>,
    pub stanox: Option<String>,
    pub crs_code: Option<String>,
    pub description: Option<String>,
    pub tps_description: Option<String>,
}

/// A schedule record from the full feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonScheduleV1 {
    #[serde(rename = "CIF_bank_holiday_running")]
    pub bank_holiday_running: Option<String>,
    #[serde(rename = "CIF_stp_indicator")]
    pub stp_indicator: Option<String>,
    #[serde(rename = "CIF_train_uid")]
    pub train_uid: Option<String>,
    pub applicable_timetable: Option<String>,
    pub atoc_code: Option<String>,
    pub new_schedule_segment: Option<NewScheduleSegment>,
    pub schedule_days_runs: Option<String>,
    pub schedule_end_date: Option<String>,
    pub schedule_segment: Option<ScheduleSegment>,
    pub schedule_start_date: Option<String>,
    pub train_status: Option<String>,
    pub transaction_type: Option<String>,
}

/// Traction details added for newer schedules.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewScheduleSegment {
    pub traction_class: Option<String>,
    pub uic_code: Option<String>,
}

/// Operational details and itinerary of a full-feed schedule.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleSegment {
    pub signalling_id: Option<String>,
    #[serde(rename = "CIF_train_category")]
    pub train_category: Option<String>,
    #[serde(rename = "CIF_headcode")]
    pub headcode: Option<String>,
    #[serde(rename = "CIF_course_indicator")]
    pub course_indicator: Option<u32>,
    #[serde(rename = "CIF_train_service_code")]
    pub train_service_code: Option<String>,
    #[serde(rename = "CIF_business_sector")]
    pub business_sector: Option<String>,
    #[serde(rename = "CIF_power_type")]
    pub power_type: Option<String>,
    #[serde(rename = "CIF_timing_load")]
    pub timing_load: Option<String>,
    #[serde(rename = "CIF_speed")]
    pub speed: Option<String>,
    #[serde(rename = "CIF_operating_characteristics")]
    pub operating_characteristics: Option<String>,
    #[serde(rename = "CIF_train_class")]
    pub train_class: Option<String>,
    #[serde(rename = "CIF_sleepers")]
    pub sleepers: Option<String>,
    #[serde(rename = "CIF_reservations")]
    pub reservations: Option<String>,
    #[serde(rename = "CIF_connection_indicator")]
    pub connection_indicator: Option<String>,
    #[serde(rename = "CIF_catering_code")]
    pub catering_code: Option<String>,
    #[serde(rename = "CIF_service_branding")]
    pub service_branding: Option<String>,
    pub schedule_location: Option<Vec<FeedLocation>>,
}

/// One itinerary entry of a full-feed schedule.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedLocation {
    pub location_type: Option<String>,
    pub record_identity: Option<String>,
    pub tiploc_code: Option<String>,
    pub tiploc_instance: Option<String>,
    pub departure: Option<String>,
    pub public_departure: Option<String>,
    pub platform: Option<String>,
    pub line: Option<String>,
    pub engineering_allowance: Option<String>,
    pub pathing_allowance: Option<String>,
    pub performance_allowance: Option<String>,
    pub arrival: Option<String>,
    pub public_arrival: Option<String>,
    pub pass: Option<String>,
    pub path: Option<String>,
}
