//! Loading the full-snapshot feed into the store.

mod error;
mod refresh;

pub use error::RefreshError;
pub use refresh::{
    DEFAULT_BATCH_SIZE, RefreshConfig, RefreshGuard, RefreshOutcome, RefreshPipeline, RefreshStats,
};
