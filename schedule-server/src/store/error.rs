//! Store error types.

/// Errors from the schedule store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The store cannot serve requests right now; callers may retry
    #[error("schedule store unavailable")]
    Unavailable,

    /// Reading or writing the on-disk snapshot failed
    #[error("snapshot error: {message}")]
    Snapshot { message: String },
}
