//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::store::StoreCounts;

/// Query string of a schedule lookup.
#[derive(Debug, Default, Deserialize)]
pub struct ScheduleParams {
    /// Service date, `YYYY-MM-DD` (defaults to today)
    pub date: Option<String>,

    /// ATOC operator code, or `any`
    pub toc: Option<String>,

    /// Tiploc the service must call at, or `any`
    pub location: Option<String>,
}

/// Body of `GET /status`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct StatusResponse {
    #[serde(rename = "ScheduleFileCount")]
    pub schedule_file_count: usize,

    #[serde(rename = "VSTPCount")]
    pub vstp_count: usize,

    pub tiplocs: usize,

    /// Whether a refresh is in progress
    pub refreshing: bool,
}

impl StatusResponse {
    pub fn new(counts: &StoreCounts, refreshing: bool) -> Self {
        Self {
            schedule_file_count: counts.feed,
            vstp_count: counts.vstp,
            tiplocs: counts.tiplocs,
            refreshing,
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
