//! Error types for marksync-sync.

use std::path::PathBuf;

use thiserror::Error;

use marksync_core::types::{FailureKind, UpdateOutcome};
use marksync_core::ConfigError;
use marksync_github::HostError;
use marksync_renderer::PatchError;

/// All errors that can end a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Signature header missing, malformed, or not matching the payload.
    #[error("invalid webhook signature")]
    Authentication,

    /// Payload is not JSON or lacks the fields a run needs.
    #[error("invalid webhook payload: {0}")]
    Payload(String),

    /// Missing secret/credential or unusable setting.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Missing marker or template failure.
    #[error("patch error: {0}")]
    Patch(#[from] PatchError),

    /// The tracked document does not exist where it was expected.
    #[error("document {path} not found on {location}")]
    DocumentNotFound { path: String, location: String },

    /// Transport or API failure talking to the host.
    #[error("upstream error: {0}")]
    Upstream(#[source] HostError),

    /// Revision token mismatch: someone else changed the document first.
    #[error("concurrent update of {path}: {message}")]
    Conflict { path: String, message: String },

    /// The scanned commit page was empty.
    #[error("no commits found on {branch} in {repo}")]
    NoCommits { repo: String, branch: String },

    /// An upstream timestamp could not be parsed.
    #[error("invalid commit timestamp '{value}': {reason}")]
    Timestamp { value: String, reason: String },

    /// A local I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<HostError> for SyncError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::Conflict { path, message } => SyncError::Conflict { path, message },
            other => SyncError::Upstream(other),
        }
    }
}

impl SyncError {
    /// Category used in outcomes and response bodies.
    pub fn kind(&self) -> FailureKind {
        match self {
            SyncError::Authentication => FailureKind::Authentication,
            SyncError::Payload(_) => FailureKind::InvalidPayload,
            SyncError::Config(_) | SyncError::Patch(_) | SyncError::DocumentNotFound { .. } => {
                FailureKind::Configuration
            }
            SyncError::Conflict { .. } => FailureKind::Conflict,
            SyncError::Upstream(_)
            | SyncError::NoCommits { .. }
            | SyncError::Timestamp { .. }
            | SyncError::Io { .. } => FailureKind::Upstream,
        }
    }

    pub fn into_outcome(self) -> UpdateOutcome {
        UpdateOutcome::Error {
            kind: self.kind(),
            reason: self.to_string(),
        }
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
