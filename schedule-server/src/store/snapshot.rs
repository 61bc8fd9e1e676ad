//! JSON snapshot of the store on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::{Schedule, Tiploc, Timetable};

use super::error::StoreError;

/// Full contents of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub schedules: Vec<Schedule>,
    pub tiplocs: Vec<Tiploc>,
    pub timetables: Vec<Timetable>,
}

/// Location of the snapshot file.
///
/// Clones share a write lock, so saves through any clone never overlap.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot.
    ///
    /// Returns `Ok(None)` if the file does not exist yet; an unreadable or
    /// corrupt file is an error.
    pub async fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Snapshot {
                    message: format!("failed to read {}: {e}", self.path.display()),
                });
            }
        };

        let snapshot: Snapshot =
            serde_json::from_str(&contents).map_err(|e| StoreError::Snapshot {
                message: format!("failed to parse {}: {e}", self.path.display()),
            })?;

        info!(
            path = %self.path.display(),
            schedules = snapshot.schedules.len(),
            tiplocs = snapshot.tiplocs.len(),
            "loaded store snapshot"
        );
        Ok(Some(snapshot))
    }

    /// Write the snapshot, creating parent directories if needed.
    ///
    /// The file is written beside the target and renamed into place, so a
    /// crash mid-write leaves the previous snapshot intact.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Snapshot {
                    message: format!("failed to create snapshot directory: {e}"),
                })?;
        }

        let json = serde_json::to_vec(snapshot).map_err(|e| StoreError::Snapshot {
            message: format!("failed to serialize snapshot: {e}"),
        })?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StoreError::Snapshot {
                message: format!("failed to write snapshot: {e}"),
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Snapshot {
                message: format!("failed to move snapshot into place: {e}"),
            })?;

        info!(
            path = %self.path.display(),
            schedules = snapshot.schedules.len(),
            "saved store snapshot"
        );
        Ok(())
    }
}
