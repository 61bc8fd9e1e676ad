//! Schedule record store.
//!
//! The engine treats persistence as a generic record store queried by field
//! predicates ([`ScheduleFilter`]). [`MemoryStore`] is the implementation
//! used by the server: indexed in-memory tables, optionally persisted as a
//! JSON snapshot between runs.

mod error;
mod filter;
mod memory;
mod snapshot;

use std::future::Future;

use serde::Serialize;

use crate::domain::{Schedule, Source, Tiploc, Timetable};

pub use error::StoreError;
pub use filter::{ScheduleFilter, ServiceDay};
pub use memory::MemoryStore;
pub use snapshot::{Snapshot, SnapshotFile};

/// Number of stored schedules by ingestion source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub feed: usize,
    pub vstp: usize,
    pub tiplocs: usize,
    pub timetables: usize,
}

/// Operations the ingestion pipelines and the resolver need from storage.
///
/// Each call is atomic on its own; a batch written by one call is never
/// observed half-applied. Nothing stronger is promised across calls.
pub trait ScheduleStore: Send + Sync + 'static {
    /// All schedules matching `filter`, ordered by identifier.
    fn find_schedules(
        &self,
        filter: &ScheduleFilter,
    ) -> impl Future<Output = Result<Vec<Schedule>, StoreError>> + Send;

    /// The schedule from `source` stored under a combined key, if any.
    fn find_by_combined_key(
        &self,
        combined_id: &str,
        source: Source,
    ) -> impl Future<Output = Result<Option<Schedule>, StoreError>> + Send;

    /// Upsert a batch: schedules with an `id` replace the stored row, the
    /// rest are inserted under fresh identifiers.
    fn save_schedules(
        &self,
        batch: Vec<Schedule>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Insert a schedule under a fresh identifier, ignoring any `id` it has.
    fn insert_schedule(
        &self,
        schedule: Schedule,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Upsert location references by Tiploc code.
    fn save_tiplocs(&self, batch: Vec<Tiploc>)
    -> impl Future<Output = Result<(), StoreError>> + Send;

    fn find_tiploc(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<Tiploc>, StoreError>> + Send;

    /// A stored watermark that makes `incoming` stale, if there is one.
    fn find_superseding_timetable(
        &self,
        incoming: &Timetable,
    ) -> impl Future<Output = Result<Option<Timetable>, StoreError>> + Send;

    fn append_timetable(
        &self,
        timetable: Timetable,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete schedules whose validity ended before `ts`, returning how many.
    fn delete_schedules_ending_before(
        &self,
        ts: i64,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;

    fn counts(&self) -> impl Future<Output = Result<StoreCounts, StoreError>> + Send;
}
