//! Anti-loop guard.
//!
//! Commits written by this tool fire the same webhooks as anyone else's. If
//! the head commit of the delivery carries a reserved prefix, the run stops
//! before any further host call.

use marksync_core::types::{first_line, RepoRef, SystemCommitPolicy};
use marksync_github::RepositoryHost;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    /// Head commit is one of ours; carries its first message line.
    SelfTriggered { message: String },
}

/// Inspect the head commit. Lookup failures fail open with a warning.
pub fn check_head_commit<H>(
    host: &H,
    repo: &RepoRef,
    head_sha: &str,
    policy: &SystemCommitPolicy,
) -> GuardDecision
where
    H: RepositoryHost + ?Sized,
{
    match host.fetch_commit(repo, head_sha) {
        Ok(commit) if policy.is_system_commit(&commit.message) => GuardDecision::SelfTriggered {
            message: first_line(&commit.message).to_string(),
        },
        Ok(_) => GuardDecision::Proceed,
        Err(e) => {
            tracing::warn!("head commit lookup for {repo}@{head_sha} failed, continuing: {e}");
            GuardDecision::Proceed
        }
    }
}
