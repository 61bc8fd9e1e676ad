//! VSTP message DTOs.
//!
//! Maps the JSON body of one message on the VSTP topic. Field names follow
//! the upstream format; almost everything is optional because the schema
//! has evolved and blank fields are common.

use serde::Deserialize;

/// Envelope of one VSTP message.
#[derive(Debug, Clone, Deserialize)]
pub struct VstpStompMsg {
    #[serde(rename = "VSTPCIFMsgV1")]
    pub msg: VstpCifMsgV1,
}

/// The amendment message itself.
#[derive(Debug, Clone, Deserialize)]
pub struct VstpCifMsgV1 {
    pub schedule: VstpSchedule,
    #[serde(rename = "Sender")]
    pub sender: Option<VstpSender>,
    pub classification: Option<String>,
    pub timestamp: Option<String>,
    pub owner: Option<String>,
    #[serde(rename = "originMsgId")]
    pub origin_msg_id: Option<String>,
}

/// Who originated the amendment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VstpSender {
    pub organisation: Option<String>,
    pub application: Option<String>,
    pub component: Option<String>,
    #[serde(rename = "userID")]
    pub user_id: Option<String>,
    #[serde(rename = "sessionID")]
    pub session_id: Option<String>,
}

/// The schedule carried by a VSTP message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VstpSchedule {
    pub schedule_segment: Option<Vec<VstpSegment>>,
    pub transaction_type: Option<String>,
    pub train_status: Option<String>,
    pub schedule_start_date: Option<String>,
    pub schedule_end_date: Option<String>,
    pub schedule_days_runs: Option<String>,
    pub applicable_timetable: Option<String>,
    #[serde(rename = "CIF_bank_holiday_running")]
    pub bank_holiday_running: Option<String>,
    #[serde(rename = "CIF_train_uid")]
    pub train_uid: Option<String>,
    #[serde(rename = "CIF_stp_indicator")]
    pub stp_indicator: Option<String>,
    /// Speed in miles per hour.
    #[serde(rename = "CIF_speed")]
    pub speed: Option<String>,
}

/// One schedule segment. Only the first segment of a message applies.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VstpSegment {
    pub schedule_location: Option<Vec<VstpLocation>>,
    pub signalling_id: Option<String>,
    pub atoc_code: Option<String>,
    #[serde(rename = "CIF_train_service_code")]
    pub train_service_code: Option<String>,
    #[serde(rename = "CIF_train_category")]
    pub train_category: Option<String>,
    #[serde(rename = "CIF_headcode")]
    pub headcode: Option<String>,
    #[serde(rename = "CIF_business_sector")]
    pub business_sector: Option<String>,
    #[serde(rename = "CIF_power_type")]
    pub power_type: Option<String>,
    #[serde(rename = "CIF_timing_load")]
    pub timing_load: Option<String>,
    #[serde(rename = "CIF_operating_characteristics")]
    pub operating_characteristics: Option<String>,
    #[serde(rename = "CIF_train_class")]
    pub train_class: Option<String>,
    #[serde(rename = "CIF_sleepers")]
    pub sleepers: Option<String>,
    #[serde(rename = "CIF_reservations")]
    pub reservations: Option<String>,
    #[serde(rename = "CIF_catering_code")]
    pub catering_code: Option<String>,
    #[serde(rename = "CIF_service_branding")]
    pub service_branding: Option<String>,
    /// Some senders put the speed on the segment instead of the schedule.
    #[serde(rename = "CIF_speed")]
    pub speed: Option<String>,
}

/// One itinerary entry of a VSTP schedule.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VstpLocation {
    pub location: Option<VstpLocationRef>,
    pub scheduled_pass_time: Option<String>,
    pub scheduled_departure_time: Option<String>,
    pub scheduled_arrival_time: Option<String>,
    pub public_departure_time: Option<String>,
    pub public_arrival_time: Option<String>,
    #[serde(rename = "CIF_platform")]
    pub platform: Option<String>,
    #[serde(rename = "CIF_line")]
    pub line: Option<String>,
    #[serde(rename = "CIF_path")]
    pub path: Option<String>,
    /// Activity code; VSTP uses it for both record identity and location type.
    #[serde(rename = "CIF_activity")]
    pub activity: Option<String>,
    #[serde(rename = "CIF_engineering_allowance")]
    pub engineering_allowance: Option<String>,
    #[serde(rename = "CIF_pathing_allowance")]
    pub pathing_allowance: Option<String>,
    #[serde(rename = "CIF_performance_allowance")]
    pub performance_allowance: Option<String>,
}

/// `location.tiploc.tiploc_id` nesting of a VSTP location.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VstpLocationRef {
    pub tiploc: Option<VstpTiplocRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VstpTiplocRef {
    pub tiploc_id: Option<String>,
}
