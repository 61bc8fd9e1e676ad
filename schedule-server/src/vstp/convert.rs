//! Conversion from VSTP messages to canonical schedules.

use crate::domain::{Schedule, ScheduleLocation, Source};
use crate::feed::parse_stp;

use super::error::VstpError;
use super::types::{VstpLocation, VstpSchedule, VstpStompMsg};

/// Miles per hour per canonical speed unit.
const MPH_PER_UNIT: f64 = 2.24;

/// Decode a message body.
pub fn decode_message(body: &[u8]) -> Result<VstpStompMsg, VstpError> {
    serde_json::from_slice(body).map_err(|e| VstpError::Json {
        message: e.to_string(),
        body: Some(String::from_utf8_lossy(body).chars().take(500).collect()),
    })
}

/// Convert a VSTP speed in mph to the canonical unit, as an integer string.
///
/// Returns an empty string when the input is not an integer.
pub fn convert_speed(mph: &str) -> String {
    match mph.trim().parse::<u32>() {
        Ok(mph) => format!("{}", (f64::from(mph) / MPH_PER_UNIT).round() as u32),
        Err(_) => String::new(),
    }
}

/// Translate a VSTP schedule into the canonical model.
///
/// Only the first schedule segment is read. Unset fields become empty.
/// The result still needs [`Schedule::augment`].
pub fn to_schedule(record: &VstpSchedule) -> Schedule {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();

    let mut schedule = Schedule {
        source: Source::Vstp.into(),
        transaction_type: text(&record.transaction_type),
        train_status: text(&record.train_status),
        stp_indicator: parse_stp(record.stp_indicator.as_deref()),
        train_uid: text(&record.train_uid),
        bank_holiday_running: text(&record.bank_holiday_running),
        applicable_timetable: text(&record.applicable_timetable),
        schedule_days_runs: text(&record.schedule_days_runs),
        schedule_start_date: text(&record.schedule_start_date),
        schedule_end_date: text(&record.schedule_end_date),
        ..Default::default()
    };

    let segment = record
        .schedule_segment
        .as_deref()
        .and_then(|segments| segments.first());

    let speed = record
        .speed
        .as_deref()
        .or_else(|| segment.and_then(|s| s.speed.as_deref()))
        .unwrap_or_default();
    schedule.speed = convert_speed(speed);

    if let Some(segment) = segment {
        schedule.signalling_id = text(&segment.signalling_id);
        schedule.atoc_code = text(&segment.atoc_code);
        schedule.train_category = text(&segment.train_category);
        schedule.train_service_code = text(&segment.train_service_code);
        schedule.headcode = text(&segment.headcode);
        schedule.business_sector = text(&segment.business_sector);
        schedule.power_type = text(&segment.power_type);
        schedule.timing_load = text(&segment.timing_load);
        schedule.operating_characteristics = text(&segment.operating_characteristics);
        schedule.train_class = text(&segment.train_class);
        schedule.sleepers = text(&segment.sleepers);
        schedule.reservations = text(&segment.reservations);
        schedule.catering_code = text(&segment.catering_code);
        schedule.service_branding = text(&segment.service_branding);
        schedule.locations = segment
            .schedule_location
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(to_location)
            .collect();
    }

    schedule
}

fn to_location(loc: &VstpLocation) -> ScheduleLocation {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    let activity = text(&loc.activity);

    let tiploc_code = loc
        .location
        .as_ref()
        .and_then(|l| l.tiploc.as_ref())
        .and_then(|t| t.tiploc_id.as_deref())
        .unwrap_or_default()
        .trim()
        .to_string();

    ScheduleLocation {
        location_type: activity.clone(),
        record_identity: activity,
        tiploc_code,
        departure: text(&loc.scheduled_departure_time),
        public_departure: text(&loc.public_departure_time),
        arrival: text(&loc.scheduled_arrival_time),
        public_arrival: text(&loc.public_arrival_time),
        pass: text(&loc.scheduled_pass_time),
        path: text(&loc.path),
        platform: text(&loc.platform),
        line: text(&loc.line),
        engineering_allowance: text(&loc.engineering_allowance),
        pathing_allowance: text(&loc.pathing_allowance),
        performance_allowance: text(&loc.performance_allowance),
        ..Default::default()
    }
}
