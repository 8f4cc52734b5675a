//! Activity resolution: which commit's timestamp and message to embed.
//!
//! | strategy  | host call                         | filtering            |
//! |-----------|-----------------------------------|----------------------|
//! | `latest`  | `commits/{branch}`                | none                 |
//! | `rest`    | one page of `commits?sha=branch`  | skip system commits  |
//! | `graphql` | `history(first: N)`               | skip system commits  |
//!
//! When every scanned commit is a system commit, the first (newest) one is
//! used anyway so that a run never ends without a fact.

use chrono::{DateTime, NaiveDateTime, Utc};

use marksync_core::types::{
    ActivityFact, ActivityStrategy, BranchName, RepoRef, SystemCommitPolicy,
};
use marksync_github::{CommitInfo, RepositoryHost};

use crate::error::SyncError;

/// Pick the first non-system commit in upstream order, else the first one.
pub fn select_commit<'c>(
    commits: &'c [CommitInfo],
    policy: &SystemCommitPolicy,
) -> Option<&'c CommitInfo> {
    commits
        .iter()
        .find(|c| !policy.is_system_commit(&c.message))
        .or_else(|| commits.first())
}

/// Parse an upstream ISO-8601 timestamp into naive UTC wall time.
///
/// Offsets are normalised to UTC; a bare `YYYY-MM-DDTHH:MM:SS` is taken as-is.
pub fn parse_commit_timestamp(raw: &str) -> Result<NaiveDateTime, SyncError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc).naive_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map_err(|e| {
        SyncError::Timestamp {
            value: raw.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Turn one commit into an embeddable fact.
pub fn fact_from_commit(commit: &CommitInfo) -> Result<ActivityFact, SyncError> {
    let timestamp = parse_commit_timestamp(&commit.date)?;
    Ok(ActivityFact::new(timestamp, Some(&commit.message)))
}

/// Resolves the latest qualifying activity on a branch.
pub struct ActivityResolver<'a, H: ?Sized> {
    host: &'a H,
    strategy: ActivityStrategy,
    lookback: u32,
    policy: &'a SystemCommitPolicy,
}

impl<'a, H> ActivityResolver<'a, H>
where
    H: RepositoryHost + ?Sized,
{
    pub fn new(
        host: &'a H,
        strategy: ActivityStrategy,
        lookback: u32,
        policy: &'a SystemCommitPolicy,
    ) -> Self {
        Self {
            host,
            strategy,
            lookback: lookback.max(1),
            policy,
        }
    }

    pub fn resolve(&self, repo: &RepoRef, branch: &BranchName) -> Result<ActivityFact, SyncError> {
        let commits = match self.strategy {
            ActivityStrategy::Latest => vec![self.host.fetch_commit(repo, &branch.0)?],
            ActivityStrategy::Rest => self.host.list_commits(repo, branch, self.lookback, 1)?,
            ActivityStrategy::Graphql => {
                self.host.commit_history(repo, branch, self.lookback)?
            }
        };

        let chosen = select_commit(&commits, self.policy).ok_or_else(|| SyncError::NoCommits {
            repo: repo.to_string(),
            branch: branch.0.clone(),
        })?;
        if self.policy.is_system_commit(&chosen.message) {
            tracing::debug!(
                "all {} scanned commit(s) on {repo}@{branch} are system commits; using {}",
                commits.len(),
                chosen.sha
            );
        }

        let fact = fact_from_commit(chosen)?;
        tracing::info!(
            "resolved activity for {repo}@{branch} via {}: {} ({})",
            self.strategy,
            fact.formatted_timestamp(),
            chosen.sha
        );
        Ok(fact)
    }
}
