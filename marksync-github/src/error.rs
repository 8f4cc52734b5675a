//! Error types for marksync-github.

use thiserror::Error;

/// Failures talking to the repository host.
#[derive(Debug, Error)]
pub enum HostError {
    /// The host answered with a non-success HTTP status.
    #[error("{operation} failed with HTTP {status}: {message}")]
    Status {
        operation: &'static str,
        status: u16,
        message: String,
    },

    /// Connection, TLS, DNS or timeout failure before a response arrived.
    #[error("{operation} transport error: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("{operation} returned an unexpected payload: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    /// The revision token supplied with a write no longer matches.
    #[error("revision conflict writing {path}: {message}")]
    Conflict { path: String, message: String },
}

impl HostError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, HostError::Conflict { .. })
    }
}
