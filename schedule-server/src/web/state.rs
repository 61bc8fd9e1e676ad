//! Application state for the web layer.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::ingest::{RefreshGuard, RefreshOutcome, RefreshPipeline};
use crate::resolve::Resolver;
use crate::store::{MemoryStore, SnapshotFile, StoreError};

/// Shared application state.
///
/// Cloned into every handler; everything inside is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,

    pub resolver: Resolver<MemoryStore>,

    /// Full-feed loader; also owns the refresh flag
    pub pipeline: RefreshPipeline<MemoryStore>,

    /// Feed file loaded by every refresh
    pub feed_path: Arc<PathBuf>,

    /// Where to persist the store after a refresh, if anywhere
    pub snapshot: Option<SnapshotFile>,
}

impl AppState {
    pub fn new(store: Arc<MemoryStore>, config: &ServerConfig) -> Self {
        Self {
            resolver: Resolver::new(store.clone()),
            pipeline: RefreshPipeline::new(store.clone(), config.refresh_config()),
            feed_path: Arc::new(config.feed_path.clone()),
            snapshot: config.snapshot_path.clone().map(SnapshotFile::new),
            store,
        }
    }

    /// Run a refresh in the background under `guard`.
    ///
    /// The store snapshot is rewritten once the feed has loaded.
    pub fn spawn_refresh(&self, guard: RefreshGuard) -> JoinHandle<()> {
        let state = self.clone();
        tokio::spawn(async move {
            match state.pipeline.run(guard, &state.feed_path).await {
                Ok(RefreshOutcome::Loaded(stats)) => {
                    info!(
                        schedules = stats.schedules,
                        tiplocs = stats.tiplocs,
                        skipped = stats.skipped,
                        evicted = stats.evicted,
                        "refresh complete"
                    );
                    if let Err(e) = state.save_snapshot().await {
                        warn!(error = %e, "failed to write store snapshot after refresh");
                    }
                }
                Ok(outcome) => info!(?outcome, "refresh made no changes"),
                Err(e) => error!(path = %state.feed_path.display(), error = %e, "refresh failed"),
            }
        })
    }

    /// Write the store to the snapshot file, if one is configured.
    pub async fn save_snapshot(&self) -> Result<(), StoreError> {
        let Some(file) = &self.snapshot else {
            return Ok(());
        };
        file.save(&self.store.snapshot().await).await
    }
}
