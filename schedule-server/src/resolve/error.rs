//! Resolution errors.

use crate::store::StoreError;

/// Errors from resolving a schedule query.
///
/// An empty result is not an error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolveError {
    /// Identifier type is not one of headcode, signallingid, ciftrainuid, trainuid
    #[error("unrecognised identifier type: {0}")]
    UnrecognisedIdentifierType(String),

    /// Date is not `YYYY-MM-DD`
    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
