//! Refresh pipeline errors.

use crate::store::StoreError;

/// Errors that abort a refresh.
///
/// Malformed lines inside the feed are not errors: they are logged, counted
/// and skipped.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("failed to read feed: {0}")]
    Io(#[from] std::io::Error),

    #[error("feed does not start with a metadata record")]
    MissingMetadata,

    #[error(transparent)]
    Store(#[from] StoreError),
}
