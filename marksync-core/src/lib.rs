//! marksync core library: domain types, settings and errors.
//!
//! - [`types`]: newtypes, activity facts, webhook events, outcomes
//! - [`settings`]: YAML + environment settings loading
//! - [`error`]: [`ConfigError`]

pub mod error;
pub mod settings;
pub mod types;

pub use error::ConfigError;
pub use settings::Settings;
pub use types::{
    ActivityFact, ActivityStrategy, BranchName, FailureKind, MarkerName, RepoRef,
    SystemCommitPolicy, UpdateOutcome, WebhookEvent,
};
