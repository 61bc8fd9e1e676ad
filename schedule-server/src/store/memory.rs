//! In-memory schedule store.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{Schedule, Source, Tiploc, Timetable};

use super::error::StoreError;
use super::filter::ScheduleFilter;
use super::snapshot::Snapshot;
use super::{ScheduleStore, StoreCounts};

type Index = HashMap<String, BTreeSet<u64>>;

#[derive(Debug, Default)]
struct Tables {
    schedules: BTreeMap<u64, Schedule>,
    by_combined_key: Index,
    by_train_uid: Index,
    by_signalling_id: Index,
    /// Locations are owned by their schedule; this indexes them by code.
    by_location: Index,
    tiplocs: HashMap<String, Tiploc>,
    timetables: Vec<Timetable>,
    next_id: u64,
}

fn index_add(index: &mut Index, key: &str, id: u64) {
    index.entry(key.to_string()).or_default().insert(id);
}

fn index_remove(index: &mut Index, key: &str, id: u64) {
    if let Some(ids) = index.get_mut(key) {
        ids.remove(&id);
        if ids.is_empty() {
            index.remove(key);
        }
    }
}

impl Tables {
    fn index(&mut self, id: u64, schedule: &Schedule) {
        index_add(&mut self.by_combined_key, &schedule.combined_id, id);
        index_add(&mut self.by_train_uid, &schedule.train_uid, id);
        index_add(&mut self.by_signalling_id, &schedule.signalling_id, id);
        for loc in &schedule.locations {
            index_add(&mut self.by_location, &loc.tiploc_code, id);
        }
    }

    fn unindex(&mut self, id: u64, schedule: &Schedule) {
        index_remove(&mut self.by_combined_key, &schedule.combined_id, id);
        index_remove(&mut self.by_train_uid, &schedule.train_uid, id);
        index_remove(&mut self.by_signalling_id, &schedule.signalling_id, id);
        for loc in &schedule.locations {
            index_remove(&mut self.by_location, &loc.tiploc_code, id);
        }
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Store under `schedule.id`, or a fresh id when it has none.
    fn put(&mut self, mut schedule: Schedule) -> u64 {
        let id = match schedule.id {
            Some(id) => {
                self.next_id = self.next_id.max(id);
                id
            }
            None => self.allocate_id(),
        };
        schedule.id = Some(id);

        if let Some(old) = self.schedules.remove(&id) {
            self.unindex(id, &old);
        }
        self.index(id, &schedule);
        self.schedules.insert(id, schedule);
        id
    }

    fn remove(&mut self, id: u64) {
        if let Some(old) = self.schedules.remove(&id) {
            self.unindex(id, &old);
        }
    }

    fn candidates(&self, filter: &ScheduleFilter) -> Vec<u64> {
        let index = if let Some(uid) = &filter.train_uid {
            self.by_train_uid.get(uid)
        } else if let Some(id) = &filter.signalling_id {
            self.by_signalling_id.get(id)
        } else if let Some(code) = &filter.location {
            self.by_location.get(code)
        } else {
            return self.schedules.keys().copied().collect();
        };
        index.map(|ids| ids.iter().copied().collect()).unwrap_or_default()
    }
}

/// Schedule store held in process memory.
///
/// Every operation takes the table lock once, so each call (and so each
/// batch) is applied atomically.
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Build a store holding the contents of a snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut tables = Tables::default();
        for schedule in snapshot.schedules {
            tables.put(schedule);
        }
        for tiploc in snapshot.tiplocs {
            tables.tiplocs.insert(tiploc.tiploc_code.clone(), tiploc);
        }
        tables.timetables = snapshot.timetables;
        Self {
            tables: RwLock::new(tables),
            available: AtomicBool::new(true),
        }
    }

    /// Copy the whole store out for persisting.
    pub async fn snapshot(&self) -> Snapshot {
        let tables = self.tables.read().await;
        let mut tiplocs: Vec<Tiploc> = tables.tiplocs.values().cloned().collect();
        tiplocs.sort_by(|a, b| a.tiploc_code.cmp(&b.tiploc_code));
        Snapshot {
            schedules: tables.schedules.values().cloned().collect(),
            tiplocs,
            timetables: tables.timetables.clone(),
        }
    }

    /// While unavailable, every operation fails with [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }
}

impl ScheduleStore for MemoryStore {
    async fn find_schedules(&self, filter: &ScheduleFilter) -> Result<Vec<Schedule>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .candidates(filter)
            .into_iter()
            .filter_map(|id| tables.schedules.get(&id))
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }

    async fn find_by_combined_key(
        &self,
        combined_id: &str,
        source: Source,
    ) -> Result<Option<Schedule>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let found = tables
            .by_combined_key
            .get(combined_id)
            .into_iter()
            .flatten()
            .filter_map(|id| tables.schedules.get(id))
            .find(|s| s.source.origin() == Some(source))
            .cloned();
        Ok(found)
    }

    async fn save_schedules(&self, batch: Vec<Schedule>) -> Result<(), StoreError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let count = batch.len();
        for schedule in batch {
            tables.put(schedule);
        }
        debug!(count, "saved schedule batch");
        Ok(())
    }

    async fn insert_schedule(&self, mut schedule: Schedule) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        schedule.id = None;
        Ok(tables.put(schedule))
    }

    async fn save_tiplocs(&self, batch: Vec<Tiploc>) -> Result<(), StoreError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        for tiploc in batch {
            tables.tiplocs.insert(tiploc.tiploc_code.clone(), tiploc);
        }
        Ok(())
    }

    async fn find_tiploc(&self, code: &str) -> Result<Option<Tiploc>, StoreError> {
        self.check_available()?;
        Ok(self.tables.read().await.tiplocs.get(code).cloned())
    }

    async fn find_superseding_timetable(
        &self,
        incoming: &Timetable,
    ) -> Result<Option<Timetable>, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .timetables
            .iter()
            .filter(|t| t.supersedes(incoming))
            .max_by_key(|t| t.timestamp)
            .cloned())
    }

    async fn append_timetable(&self, timetable: Timetable) -> Result<(), StoreError> {
        self.check_available()?;
        self.tables.write().await.timetables.push(timetable);
        Ok(())
    }

    async fn delete_schedules_ending_before(&self, ts: i64) -> Result<usize, StoreError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let expired: Vec<u64> = tables
            .schedules
            .iter()
            .filter(|(_, s)| s.schedule_end_date_ts < ts)
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            tables.remove(*id);
        }
        Ok(expired.len())
    }

    async fn counts(&self) -> Result<StoreCounts, StoreError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let mut counts = StoreCounts {
            tiplocs: tables.tiplocs.len(),
            timetables: tables.timetables.len(),
            ..Default::default()
        };
        for schedule in tables.schedules.values() {
            match schedule.source.origin() {
                Some(Source::Feed) => counts.feed += 1,
                Some(Source::Vstp) => counts.vstp += 1,
                None => {}
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ScheduleLocation, StpIndicator};

    fn schedule(uid: &str, stp: StpIndicator, source: Source) -> Schedule {
        let mut s = Schedule {
            source: source.into(),
            stp_indicator: Some(stp),
            train_uid: uid.to_string(),
            signalling_id: "1A01".to_string(),
            schedule_days_runs: "1111111".to_string(),
            schedule_start_date: "2023-10-01".to_string(),
            schedule_end_date: "2023-10-31".to_string(),
            locations: vec![ScheduleLocation {
                record_identity: "LO".to_string(),
                tiploc_code: "DRBY".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        s.augment();
        s
    }

    #[tokio::test]
    async fn upsert_by_id_replaces_row_and_indexes() {
        let store = MemoryStore::new();
        store
            .save_schedules(vec![schedule("A00001", StpIndicator::Permanent, Source::Feed)])
            .await
            .unwrap();

        let mut stored = store
            .find_by_combined_key("A000012023-10-01P", Source::Feed)
            .await
            .unwrap()
            .unwrap();
        stored.signalling_id = "2B02".to_string();
        stored.locations[0].tiploc_code = "NTNG".to_string();
        store.save_schedules(vec![stored]).await.unwrap();

        assert_eq!(store.counts().await.unwrap().feed, 1);
        let by_old = store
            .find_schedules(&ScheduleFilter::for_signalling_id("1A01"))
            .await
            .unwrap();
        assert!(by_old.is_empty());
        let by_new = store
            .find_schedules(&ScheduleFilter::for_signalling_id("2B02"))
            .await
            .unwrap();
        assert_eq!(by_new.len(), 1);
        let by_loc = store
            .find_schedules(&ScheduleFilter::default().with_location(Some("DRBY".into())))
            .await
            .unwrap();
        assert!(by_loc.is_empty());
    }

    #[tokio::test]
    async fn insert_always_creates_a_row() {
        let store = MemoryStore::new();
        let s = schedule("A00002", StpIndicator::Overlay, Source::Vstp);
        let a = store.insert_schedule(s.clone()).await.unwrap();
        let b = store.insert_schedule(s).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.counts().await.unwrap().vstp, 2);
    }

    #[tokio::test]
    async fn combined_key_lookup_respects_source() {
        let store = MemoryStore::new();
        store
            .insert_schedule(schedule("A00003", StpIndicator::Permanent, Source::Vstp))
            .await
            .unwrap();
        let feed = store
            .find_by_combined_key("A000032023-10-01P", Source::Feed)
            .await
            .unwrap();
        assert!(feed.is_none());
        let vstp = store
            .find_by_combined_key("A000032023-10-01P", Source::Vstp)
            .await
            .unwrap();
        assert!(vstp.is_some());
    }

    #[tokio::test]
    async fn tiplocs_upsert_by_code() {
        let store = MemoryStore::new();
        let tiploc = |desc: &str| Tiploc {
            tiploc_code: "DRBY".to_string(),
            tps_description: desc.to_string(),
            ..Default::default()
        };
        store.save_tiplocs(vec![tiploc("DERBY")]).await.unwrap();
        store.save_tiplocs(vec![tiploc("DERBY MIDLAND")]).await.unwrap();

        let found = store.find_tiploc("DRBY").await.unwrap().unwrap();
        assert_eq!(found.tps_description, "DERBY MIDLAND");
        assert_eq!(store.counts().await.unwrap().tiplocs, 1);
        assert!(store.find_tiploc("NTNG").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn superseding_timetable() {
        let store = MemoryStore::new();
        let tt = |ts| Timetable {
            classification: "public".to_string(),
            timestamp: ts,
            ..Default::default()
        };
        assert!(store.find_superseding_timetable(&tt(100)).await.unwrap().is_none());
        store.append_timetable(tt(100)).await.unwrap();
        assert!(store.find_superseding_timetable(&tt(100)).await.unwrap().is_some());
        assert!(store.find_superseding_timetable(&tt(99)).await.unwrap().is_some());
        assert!(store.find_superseding_timetable(&tt(101)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_expired() {
        let store = MemoryStore::new();
        let mut old = schedule("A00004", StpIndicator::Permanent, Source::Feed);
        old.schedule_end_date = "2023-01-31".to_string();
        old.augment();
        store
            .save_schedules(vec![old, schedule("A00005", StpIndicator::Permanent, Source::Feed)])
            .await
            .unwrap();

        // 2023-10-01T00:00:00Z
        let removed = store.delete_schedules_ending_before(1_696_118_400).await.unwrap();
        assert_eq!(removed, 1);
        let left = store.find_schedules(&ScheduleFilter::default()).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].train_uid, "A00005");
        assert!(
            store
                .find_schedules(&ScheduleFilter::for_train_uid("A00004"))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_available(false);
        assert!(matches!(
            store.counts().await,
            Err(StoreError::Unavailable)
        ));
        assert!(store.find_tiploc("DRBY").await.is_err());
        store.set_available(true);
        assert!(store.counts().await.is_ok());
    }

    #[tokio::test]
    async fn snapshot_round_trip_keeps_ids() {
        let store = MemoryStore::new();
        store
            .save_schedules(vec![schedule("A00006", StpIndicator::Permanent, Source::Feed)])
            .await
            .unwrap();
        let snapshot = store.snapshot().await;

        let restored = MemoryStore::from_snapshot(snapshot);
        let found = restored
            .find_schedules(&ScheduleFilter::for_train_uid("A00006"))
            .await
            .unwrap();
        assert_eq!(found[0].id, Some(1));
        // Fresh ids continue after the restored ones
        let id = restored
            .insert_schedule(schedule("A00007", StpIndicator::Overlay, Source::Vstp))
            .await
            .unwrap();
        assert_eq!(id, 2);
    }
}
