//! The canonical schedule record.
//!
//! Both ingestion sources translate into [`Schedule`]. Derived fields (code
//! descriptions, epoch validity bounds, the combined key) are never trusted
//! from input: [`Schedule::augment`] recomputes them, and it is idempotent.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::codes;
use super::days::DaysRun;
use super::location::ScheduleLocation;
use super::operator::operator_name;
use super::source::SourceLabel;
use super::stp::StpIndicator;
use super::time::{end_of_day_ts, parse_cif_date, start_of_day_ts};

/// One version of a train service's plan.
///
/// A train (identified by its UID) has several versions; a single version is
/// identified by UID, start date and STP indicator, see [`combined_key`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schedule {
    /// Store-assigned identifier; `None` until first saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub combined_id: String,
    pub source: SourceLabel,

    #[serde(rename = "CIF_bank_holiday_running")]
    pub bank_holiday_running: String,
    #[serde(rename = "CIF_stp_indicator")]
    pub stp_indicator: Option<StpIndicator>,
    #[serde(rename = "CIF_train_uid")]
    pub train_uid: String,
    pub applicable_timetable: String,
    pub atoc_code: String,
    pub atoc_code_description: String,
    pub schedule_days_runs: String,
    pub schedule_end_date: String,
    pub schedule_start_date: String,
    pub train_status: String,
    pub train_status_description: String,
    pub transaction_type: String,

    pub traction_class: String,
    pub uic_code: String,

    pub signalling_id: String,
    #[serde(rename = "CIF_train_category")]
    pub train_category: String,
    #[serde(rename = "CIF_train_category_description")]
    pub train_category_description: String,
    #[serde(rename = "CIF_headcode")]
    pub headcode: String,
    #[serde(rename = "CIF_course_indicator")]
    pub course_indicator: u32,
    #[serde(rename = "CIF_train_service_code")]
    pub train_service_code: String,
    #[serde(rename = "CIF_business_sector")]
    pub business_sector: String,
    #[serde(rename = "CIF_power_type")]
    pub power_type: String,
    #[serde(rename = "CIF_power_type_description")]
    pub power_type_description: String,
    #[serde(rename = "CIF_timing_load")]
    pub timing_load: String,
    #[serde(rename = "CIF_timing_load_description")]
    pub timing_load_description: String,
    /// Line speed in the feed's units.
    #[serde(rename = "CIF_speed")]
    pub speed: String,
    #[serde(rename = "CIF_operating_characteristics")]
    pub operating_characteristics: String,
    #[serde(rename = "CIF_operating_characteristics_description")]
    pub operating_characteristics_description: String,
    #[serde(rename = "CIF_train_class")]
    pub train_class: String,
    #[serde(rename = "CIF_sleepers")]
    pub sleepers: String,
    #[serde(rename = "CIF_reservations")]
    pub reservations: String,
    #[serde(rename = "CIF_connection_indicator")]
    pub connection_indicator: String,
    #[serde(rename = "CIF_catering_code")]
    pub catering_code: String,
    #[serde(rename = "CIF_service_branding")]
    pub service_branding: String,

    #[serde(rename = "schedule_location")]
    pub locations: Vec<ScheduleLocation>,

    /// Validity start as a Unix timestamp (00:00:00 on the start date).
    pub schedule_start_date_ts: i64,
    /// Validity end as a Unix timestamp (23:59:59 on the end date).
    pub schedule_end_date_ts: i64,
}

/// The natural identity of a schedule version: UID + start date + STP code.
pub fn combined_key(train_uid: &str, start_date: &str, stp: Option<StpIndicator>) -> String {
    let stp = stp.map(|s| s.code()).unwrap_or("");
    format!("{}{}{}", train_uid.trim(), start_date, stp)
}

impl Schedule {
    /// Recompute every derived field.
    ///
    /// Descriptions are looked up from the codes; the train UID is trimmed;
    /// validity dates are converted to epoch bounds; the combined key is
    /// rebuilt. A date that fails to parse leaves its epoch field as it was
    /// and is logged, so the schedule stays usable with the best data
    /// available.
    pub fn augment(&mut self) {
        self.train_category_description = codes::train_category(&self.train_category).to_string();
        self.operating_characteristics_description =
            codes::operating_characteristics(&self.operating_characteristics);
        self.power_type_description = codes::power_type(&self.power_type).to_string();
        self.train_status_description = codes::train_status(&self.train_status).to_string();
        self.timing_load_description = codes::timing_load(&self.timing_load, &self.power_type);
        self.atoc_code_description = operator_name(&self.atoc_code);

        self.train_uid = self.train_uid.trim().to_string();

        match parse_cif_date(&self.schedule_start_date) {
            Ok(date) => self.schedule_start_date_ts = start_of_day_ts(date),
            Err(e) => warn!(
                train_uid = %self.train_uid,
                start_date = %self.schedule_start_date,
                error = %e,
                "failed to parse schedule start date"
            ),
        }

        match parse_cif_date(&self.schedule_end_date) {
            Ok(date) => self.schedule_end_date_ts = end_of_day_ts(date),
            Err(e) => warn!(
                train_uid = %self.train_uid,
                end_date = %self.schedule_end_date,
                error = %e,
                "failed to parse schedule end date"
            ),
        }

        self.combined_id = combined_key(
            &self.train_uid,
            &self.schedule_start_date,
            self.stp_indicator,
        );
    }

    /// Parsed days-run mask, or `None` when the stored string is malformed.
    pub fn days_run(&self) -> Option<DaysRun> {
        DaysRun::parse(&self.schedule_days_runs)
    }

    /// Whether the validity window contains the whole of `[day_start, day_end]`.
    pub fn covers_day(&self, day_start: i64, day_end: i64) -> bool {
        self.schedule_start_date_ts <= day_start && self.schedule_end_date_ts >= day_end
    }

    /// Whether any location in the itinerary references `tiploc_code`.
    pub fn calls_at(&self, tiploc_code: &str) -> bool {
        self.locations.iter().any(|l| l.tiploc_code == tiploc_code)
    }

    /// Apply an amendment on top of this schedule, returning a new schedule.
    ///
    /// Every non-empty field of `overlay` replaces the base's; empty overlay
    /// fields leave the base unchanged. The location list is replaced
    /// wholesale. Source labels are concatenated and the result is
    /// re-augmented. The stored identity (`id`) of the base is kept.
    pub fn merge(&self, overlay: &Schedule) -> Schedule {
        let mut merged = self.clone();

        macro_rules! take_non_empty {
            ($($field:ident),+ $(,)?) => {
                $(
                    if !overlay.$field.is_empty() {
                        merged.$field = overlay.$field.clone();
                    }
                )+
            };
        }

        take_non_empty!(
            bank_holiday_running,
            applicable_timetable,
            atoc_code,
            schedule_days_runs,
            schedule_end_date,
            schedule_start_date,
            train_status,
            transaction_type,
            traction_class,
            uic_code,
            signalling_id,
            train_category,
            headcode,
            train_service_code,
            business_sector,
            power_type,
            timing_load,
            speed,
            operating_characteristics,
            train_class,
            sleepers,
            reservations,
            connection_indicator,
            catering_code,
            service_branding,
        );

        if overlay.stp_indicator.is_some() {
            merged.stp_indicator = overlay.stp_indicator;
        }
        if overlay.course_indicator != 0 {
            merged.course_indicator = overlay.course_indicator;
        }

        merged.locations = overlay.locations.clone();
        merged.source.extend(&overlay.source);
        merged.augment();
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Source;

    fn sample() -> Schedule {
        Schedule {
            source: Source::Feed.into(),
            stp_indicator: Some(StpIndicator::Permanent),
            train_uid: " C12345".to_string(),
            atoc_code: "GW".to_string(),
            schedule_days_runs: "1111100".to_string(),
            schedule_start_date: "2023-05-21".to_string(),
            schedule_end_date: "2023-12-03".to_string(),
            train_status: "P".to_string(),
            signalling_id: "2A20".to_string(),
            train_category: "OO".to_string(),
            power_type: "DMU".to_string(),
            timing_load: "E".to_string(),
            speed: "090".to_string(),
            operating_characteristics: "D".to_string(),
            locations: vec![ScheduleLocation {
                record_identity: "LO".to_string(),
                tiploc_code: "DRBY".to_string(),
                departure: "0756".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn augment_derives_fields() {
        let mut s = sample();
        s.augment();

        assert_eq!(s.train_uid, "C12345");
        assert_eq!(s.combined_id, "C123452023-05-21P");
        assert_eq!(s.train_category_description, "Ordinary Passenger");
        assert_eq!(s.power_type_description, "Diesel Mechanical Multiple Unit");
        assert_eq!(s.timing_load_description, "Class 158, 168, 170 or 175");
        assert_eq!(s.atoc_code_description, "Great Western Railway");
        assert_eq!(s.operating_characteristics_description, "DOO (Coaching stock trains)");
        assert_eq!(s.schedule_start_date_ts, 1_684_627_200);
        assert_eq!(s.schedule_end_date_ts, 1_701_647_999);
    }

    #[test]
    fn augment_keeps_previous_ts_on_bad_date() {
        let mut s = sample();
        s.schedule_start_date_ts = 42;
        s.schedule_start_date = "not a date".to_string();
        s.augment();
        assert_eq!(s.schedule_start_date_ts, 42);
        assert_eq!(s.combined_id, "C12345not a dateP");
    }

    #[test]
    fn combined_key_without_stp() {
        assert_eq!(combined_key(" X1 ", "2023-01-01", None), "X12023-01-01");
    }

    #[test]
    fn merge_takes_only_non_empty_fields() {
        let mut base = sample();
        base.id = Some(7);
        base.augment();

        let mut overlay = Schedule {
            source: Source::Vstp.into(),
            stp_indicator: Some(StpIndicator::Overlay),
            train_uid: "C12345".to_string(),
            power_type: "EMU".to_string(),
            speed: "45".to_string(),
            locations: vec![
                ScheduleLocation {
                    record_identity: "TB".to_string(),
                    tiploc_code: "NTNG".to_string(),
                    ..Default::default()
                },
                ScheduleLocation {
                    record_identity: "TF".to_string(),
                    tiploc_code: "SHEFFLD".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        overlay.augment();

        let merged = base.merge(&overlay);

        assert_eq!(merged.id, Some(7));
        assert_eq!(merged.stp_indicator, Some(StpIndicator::Overlay));
        assert_eq!(merged.power_type, "EMU");
        assert_eq!(merged.power_type_description, "Electric Multiple Unit");
        assert_eq!(merged.speed, "45");
        // Empty on the overlay, so the base survives
        assert_eq!(merged.signalling_id, "2A20");
        assert_eq!(merged.atoc_code, "GW");
        assert_eq!(merged.schedule_start_date, "2023-05-21");
        // Locations replaced wholesale
        assert_eq!(merged.locations.len(), 2);
        assert_eq!(merged.locations[0].tiploc_code, "NTNG");
        assert_eq!(merged.source.to_string(), "Feed,VSTP");
        assert_eq!(merged.combined_id, "C123452023-05-21O");

        // The base itself is untouched
        assert_eq!(base.power_type, "DMU");
        assert_eq!(base.locations.len(), 1);
    }

    #[test]
    fn serialises_with_cif_names() {
        let mut s = sample();
        s.augment();
        let value = serde_json::to_value(&s).unwrap();
        assert_eq!(value["CIF_train_uid"], "C12345");
        assert_eq!(value["CIF_stp_indicator"], "P");
        assert_eq!(value["source"], "Feed");
        assert_eq!(value["schedule_location"][0]["tiploc_code"], "DRBY");
        assert!(value.get("id").is_none());
    }
}
