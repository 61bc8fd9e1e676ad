//! The refresh pipeline.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::domain::{Schedule, Source, Tiploc};
use crate::feed::{FeedRecord, decode_line, to_schedule, to_tiploc};
use crate::store::ScheduleStore;

use super::error::RefreshError;

/// Records written to the store per call.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Refresh policy.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub batch_size: usize,
    /// Delete schedules whose validity has ended once the new feed is in.
    pub evict_expired: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            evict_expired: false,
        }
    }
}

impl RefreshConfig {
    pub fn with_evict_expired(mut self, evict: bool) -> Self {
        self.evict_expired = evict;
        self
    }
}

/// Counters for one completed refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshStats {
    pub schedules: usize,
    pub tiplocs: usize,
    /// Lines that failed to decode.
    pub skipped: usize,
    pub evicted: usize,
}

/// How a refresh call ended, short of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The feed was loaded.
    Loaded(RefreshStats),
    /// A stored watermark is as new as the feed; nothing was written.
    Superseded {
        stored_timestamp: i64,
        incoming_timestamp: i64,
    },
    /// Another refresh holds the flag; nothing was done.
    AlreadyRunning,
}

/// Proof of holding the refresh flag. Dropping it releases the flag.
#[derive(Debug)]
pub struct RefreshGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Loads the full-snapshot feed into the store, one refresh at a time.
pub struct RefreshPipeline<S> {
    store: Arc<S>,
    running: Arc<AtomicBool>,
    config: RefreshConfig,
}

impl<S> Clone for RefreshPipeline<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            running: self.running.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: ScheduleStore> RefreshPipeline<S> {
    pub fn new(store: Arc<S>, config: RefreshConfig) -> Self {
        Self {
            store,
            running: Arc::new(AtomicBool::new(false)),
            config,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Take the refresh flag, or `None` if a refresh is in progress.
    pub fn try_acquire(&self) -> Option<RefreshGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshGuard {
                flag: self.running.clone(),
            })
    }

    /// Load the feed at `path` unless a refresh is already running.
    pub async fn refresh(&self, path: &Path) -> Result<RefreshOutcome, RefreshError> {
        let Some(guard) = self.try_acquire() else {
            info!(path = %path.display(), "refresh already in progress, ignoring request");
            return Ok(RefreshOutcome::AlreadyRunning);
        };
        self.run(guard, path).await
    }

    /// Load the feed at `path` under an already-acquired flag.
    ///
    /// The flag is released when this returns, whatever the outcome.
    pub async fn run(&self, guard: RefreshGuard, path: &Path) -> Result<RefreshOutcome, RefreshError> {
        info!(path = %path.display(), "starting schedule refresh");
        let file = tokio::fs::File::open(path).await?;
        self.run_from_reader(&guard, BufReader::new(file)).await
    }

    /// Load a feed from any line-oriented reader.
    pub async fn run_from_reader<R>(
        &self,
        _guard: &RefreshGuard,
        reader: R,
    ) -> Result<RefreshOutcome, RefreshError>
    where
        R: AsyncBufRead + Unpin,
    {
        let started = Instant::now();
        let mut lines = reader.split(b'\n');

        let header = lines
            .next_segment()
            .await?
            .ok_or(RefreshError::MissingMetadata)?;
        let timetable = match decode_line(&String::from_utf8_lossy(&header)) {
            Ok(Some(FeedRecord::Timetable(timetable))) => timetable,
            Ok(_) => return Err(RefreshError::MissingMetadata),
            Err(e) => {
                warn!(error = %e, "failed to decode feed metadata");
                return Err(RefreshError::MissingMetadata);
            }
        };

        if let Some(stored) = self.store.find_superseding_timetable(&timetable).await? {
            warn!(
                stored_timestamp = stored.timestamp,
                incoming_timestamp = timetable.timestamp,
                "feed is not newer than the stored timetable, skipping refresh"
            );
            return Ok(RefreshOutcome::Superseded {
                stored_timestamp: stored.timestamp,
                incoming_timestamp: timetable.timestamp,
            });
        }

        info!(
            timestamp = timetable.timestamp,
            sequence = timetable.metadata.sequence,
            kind = %timetable.metadata.kind,
            "loading schedule feed"
        );

        let mut stats = RefreshStats::default();
        let mut schedules: Vec<Schedule> = Vec::with_capacity(self.config.batch_size);
        let mut tiplocs: Vec<Tiploc> = Vec::with_capacity(self.config.batch_size);
        let mut line_no = 1usize;

        while let Some(bytes) = lines.next_segment().await? {
            line_no += 1;
            let Ok(line) = std::str::from_utf8(&bytes) else {
                warn!(line = line_no, "skipping feed line that is not UTF-8");
                stats.skipped += 1;
                continue;
            };
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            match decode_line(line) {
                Ok(Some(FeedRecord::Schedule(raw))) => {
                    let mut schedule = to_schedule(&raw);
                    schedule.augment();
                    self.stage(&mut schedules, schedule).await?;
                    stats.schedules += 1;
                    if schedules.len() >= self.config.batch_size {
                        self.store.save_schedules(std::mem::take(&mut schedules)).await?;
                    }
                }
                Ok(Some(FeedRecord::Tiploc(raw))) => {
                    tiplocs.push(to_tiploc(&raw));
                    stats.tiplocs += 1;
                    if tiplocs.len() >= self.config.batch_size {
                        self.store.save_tiplocs(std::mem::take(&mut tiplocs)).await?;
                    }
                }
                Ok(Some(FeedRecord::Timetable(_))) => {
                    warn!(line = line_no, "ignoring repeated metadata record");
                    stats.skipped += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(line = line_no, error = %e, "skipping malformed feed line");
                    stats.skipped += 1;
                }
            }
        }

        if !schedules.is_empty() {
            self.store.save_schedules(schedules).await?;
        }
        if !tiplocs.is_empty() {
            self.store.save_tiplocs(tiplocs).await?;
        }

        self.store.append_timetable(timetable).await?;

        if self.config.evict_expired {
            stats.evicted = self.evict_expired().await;
        }

        info!(
            schedules = stats.schedules,
            tiplocs = stats.tiplocs,
            skipped = stats.skipped,
            evicted = stats.evicted,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "schedule feed loaded"
        );
        Ok(RefreshOutcome::Loaded(stats))
    }

    /// Queue a schedule for the next batch, reusing the identifier of the
    /// stored (or already queued) full-feed row with the same combined key.
    async fn stage(&self, batch: &mut Vec<Schedule>, mut schedule: Schedule) -> Result<(), RefreshError> {
        if let Some(queued) = batch
            .iter_mut()
            .find(|s| s.combined_id == schedule.combined_id)
        {
            schedule.id = queued.id;
            *queued = schedule;
            return Ok(());
        }

        if let Some(existing) = self
            .store
            .find_by_combined_key(&schedule.combined_id, Source::Feed)
            .await?
        {
            debug!(combined_id = %schedule.combined_id, id = ?existing.id, "updating stored schedule");
            schedule.id = existing.id;
        }
        batch.push(schedule);
        Ok(())
    }

    /// Best-effort removal of schedules whose validity has ended.
    async fn evict_expired(&self) -> usize {
        let now = Utc::now().timestamp();
        match self.store.delete_schedules_ending_before(now).await {
            Ok(count) => {
                info!(count, "evicted expired schedules");
                count
            }
            Err(e) => {
                warn!(error = %e, "failed to evict expired schedules");
                0
            }
        }
    }
}
