//! Feed decoding errors.

/// Errors from decoding a line of the full-snapshot feed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FeedError {
    /// The line is not valid JSON for any known record shape
    #[error("JSON parse error: {message} (line: {line})")]
    Json { message: String, line: String },
}
