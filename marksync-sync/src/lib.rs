//! # marksync-sync
//!
//! Webhook pipeline and persistence for marker-delimited document sections.
//!
//! - [`WebhookPipeline`] runs one signed delivery end to end and returns an
//!   [`UpdateOutcome`](marksync_core::UpdateOutcome).
//! - [`update_document`] / [`diff_document`] are the standalone entrypoints
//!   used by the CLI.

pub mod activity;
pub mod diff;
pub mod error;
pub mod event;
pub mod gate;
pub mod guard;
pub mod pipeline;
pub mod signature;
pub mod standalone;
pub mod writer;

pub use activity::ActivityResolver;
pub use diff::diff_document;
pub use error::SyncError;
pub use pipeline::{PipelineOptions, WebhookPipeline};
pub use signature::{sign, verify_signature};
pub use standalone::{ensure_markers, update_document, LocalUpdate};
pub use writer::{WriteResult, BACKUP_SUFFIX};
