//! Classification of feed lines and conversion to canonical records.

use tracing::debug;

use crate::domain::{Schedule, ScheduleLocation, Source, StpIndicator, Tiploc, Timetable};

use super::error::FeedError;
use super::types::{FeedLocation, JsonScheduleV1, RawFeedLine, TiplocV1};

/// A classified line of the full-snapshot feed.
#[derive(Debug, Clone)]
pub enum FeedRecord {
    /// The metadata header; must be the first line.
    Timetable(Timetable),
    /// A schedule version.
    Schedule(Box<JsonScheduleV1>),
    /// A location reference.
    Tiploc(TiplocV1),
}

impl FeedRecord {
    /// Classify a decoded line by which payload carries its discriminating
    /// field: a classification for metadata, a train UID for schedules, a
    /// Tiploc code for locations.
    ///
    /// Returns `None` for payloads this service does not ingest.
    pub fn classify(raw: RawFeedLine) -> Option<Self> {
        if let Some(timetable) = raw.timetable
            && !timetable.classification.is_empty()
        {
            return Some(FeedRecord::Timetable(timetable));
        }

        if let Some(schedule) = raw.schedule
            && schedule.train_uid.as_deref().is_some_and(|uid| !uid.is_empty())
        {
            return Some(FeedRecord::Schedule(Box::new(schedule)));
        }

        if let Some(tiploc) = raw.tiploc
            && tiploc.tiploc_code.as_deref().is_some_and(|code| !code.is_empty())
        {
            return Some(FeedRecord::Tiploc(tiploc));
        }

        None
    }
}

/// Decode and classify one line of the feed.
///
/// `Ok(None)` means the line is well-formed JSON of a kind we skip.
pub fn decode_line(line: &str) -> Result<Option<FeedRecord>, FeedError> {
    let raw: RawFeedLine = serde_json::from_str(line).map_err(|e| FeedError::Json {
        message: e.to_string(),
        line: line.chars().take(200).collect(),
    })?;
    Ok(FeedRecord::classify(raw))
}

/// Translate a full-feed schedule into the canonical model.
///
/// Fields are copied one-to-one; the speed is already in canonical units.
/// Unset fields become empty. The result still needs [`Schedule::augment`].
pub fn to_schedule(record: &JsonScheduleV1) -> Schedule {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();

    let mut schedule = Schedule {
        source: Source::Feed.into(),
        bank_holiday_running: text(&record.bank_holiday_running),
        stp_indicator: parse_stp(record.stp_indicator.as_deref()),
        train_uid: text(&record.train_uid),
        applicable_timetable: text(&record.applicable_timetable),
        atoc_code: text(&record.atoc_code),
        schedule_days_runs: text(&record.schedule_days_runs),
        schedule_end_date: text(&record.schedule_end_date),
        schedule_start_date: text(&record.schedule_start_date),
        train_status: text(&record.train_status),
        transaction_type: text(&record.transaction_type),
        ..Default::default()
    };

    if let Some(new_segment) = &record.new_schedule_segment {
        schedule.traction_class = text(&new_segment.traction_class);
        schedule.uic_code = text(&new_segment.uic_code);
    }

    if let Some(segment) = &record.schedule_segment {
        schedule.signalling_id = text(&segment.signalling_id);
        schedule.train_category = text(&segment.train_category);
        schedule.headcode = text(&segment.headcode);
        schedule.course_indicator = segment.course_indicator.unwrap_or_default();
        schedule.train_service_code = text(&segment.train_service_code);
        schedule.business_sector = text(&segment.business_sector);
        schedule.power_type = text(&segment.power_type);
        schedule.timing_load = text(&segment.timing_load);
        schedule.speed = text(&segment.speed);
        schedule.operating_characteristics = text(&segment.operating_characteristics);
        schedule.train_class = text(&segment.train_class);
        schedule.sleepers = text(&segment.sleepers);
        schedule.reservations = text(&segment.reservations);
        schedule.connection_indicator = text(&segment.connection_indicator);
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

fn to_location(loc: &FeedLocation) -> ScheduleLocation {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();

    ScheduleLocation {
        location_type: text(&loc.location_type),
        record_identity: text(&loc.record_identity),
        tiploc_code: text(&loc.tiploc_code),
        tiploc_instance: text(&loc.tiploc_instance),
        departure: text(&loc.departure),
        public_departure: text(&loc.public_departure),
        platform: text(&loc.platform),
        line: text(&loc.line),
        engineering_allowance: text(&loc.engineering_allowance),
        pathing_allowance: text(&loc.pathing_allowance),
        performance_allowance: text(&loc.performance_allowance),
        arrival: text(&loc.arrival),
        public_arrival: text(&loc.public_arrival),
        pass: text(&loc.pass),
        path: text(&loc.path),
    }
}

/// Translate a full-feed location reference.
pub fn to_tiploc(record: &TiplocV1) -> Tiploc {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();

    Tiploc {
        transaction_type: text(&record.transaction_type),
        tiploc_code: text(&record.tiploc_code).trim().to_string(),
        nalco: text(&record.nalco),
        stanox: text(&record.stanox),
        crs_code: text(&record.crs_code),
        description: text(&record.description),
        tps_description: text(&record.tps_description),
    }
}

/// Parse an STP code, treating blanks and unknown codes as unset.
pub(crate) fn parse_stp(code: Option<&str>) -> Option<StpIndicator> {
    let code = code?;
    if code.trim().is_empty() {
        return None;
    }
    match StpIndicator::parse(code) {
        Ok(stp) => Some(stp),
        Err(e) => {
            debug!(error = %e, "ignoring unknown STP indicator");
            None
        }
    }
}
