//! VSTP consumer error types.

use std::fmt;

/// Errors from the real-time amendment stream.
#[derive(Debug)]
pub enum VstpError {
    /// Socket failure (connect refused, reset, etc.)
    Io(std::io::Error),

    /// The broker sent something that is not a valid frame
    Protocol(String),

    /// The broker answered with an ERROR frame
    Rejected { message: String },

    /// The broker closed the connection
    ConnectionClosed,

    /// A message arrived with no body
    EmptyBody,

    /// JSON deserialization of a message body failed
    Json {
        message: String,
        body: Option<String>,
    },
}

impl fmt::Display for VstpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VstpError::Io(e) => write!(f, "I/O error: {e}"),
            VstpError::Protocol(msg) => write!(f, "protocol error: {msg}"),
            VstpError::Rejected { message } => write!(f, "rejected by broker: {message}"),
            VstpError::ConnectionClosed => write!(f, "connection closed by broker"),
            VstpError::EmptyBody => write!(f, "message has an empty body"),
            VstpError::Json { message, body } => {
                write!(f, "JSON parse error: {message}")?;
                if let Some(body) = body {
                    write!(f, " (body: {body})")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for VstpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VstpError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for VstpError {
    fn from(err: std::io::Error) -> Self {
        VstpError::Io(err)
    }
}
