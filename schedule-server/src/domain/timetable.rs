//! Full-feed generation watermark.

use serde::{Deserialize, Serialize};

/// Who produced a feed file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimetableSender {
    pub organisation: String,
    pub application: String,
    pub component: String,
}

/// Feed kind (`full` or `update`) and sequence number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimetableMetadata {
    #[serde(rename = "type")]
    pub kind: String,
    pub sequence: i64,
}

/// Metadata header of one full-snapshot feed.
///
/// One row is appended per successful refresh. The `timestamp` is the
/// watermark: a feed whose timestamp is not newer than every stored row is
/// stale and must not be loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timetable {
    pub classification: String,
    pub timestamp: i64,
    pub owner: String,
    #[serde(rename = "Sender")]
    pub sender: TimetableSender,
    #[serde(rename = "Metadata")]
    pub metadata: TimetableMetadata,
}

impl Timetable {
    /// Whether `self` makes a feed carrying `incoming` stale.
    pub fn supersedes(&self, incoming: &Timetable) -> bool {
        self.timestamp >= incoming.timestamp
    }
}
