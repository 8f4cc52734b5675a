//! Repository-host operations the sync pipeline depends on.

use marksync_core::types::{BranchName, RepoRef};

use crate::error::HostError;

/// A text file read from the host together with its revision token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub content: String,
    /// Blob sha; must accompany the next write of this path.
    pub sha: String,
}

/// Commit metadata as returned by the host, not yet normalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub sha: String,
    /// Full message, possibly multi-line.
    pub message: String,
    /// ISO-8601 timestamp, usually with a trailing `Z`.
    pub date: String,
}

/// One file write, conditioned on `previous_sha` when the file exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpdate<'a> {
    pub path: &'a str,
    pub content: &'a str,
    pub message: &'a str,
    pub previous_sha: Option<&'a str>,
    pub branch: &'a BranchName,
}

/// Hosting-API surface used by the anti-loop guard, activity resolver and
/// remote persistence.
pub trait RepositoryHost: Send + Sync {
    /// File content + revision token; `None` when the path does not exist.
    fn fetch_file(
        &self,
        repo: &RepoRef,
        path: &str,
        branch: &BranchName,
    ) -> Result<Option<RemoteFile>, HostError>;

    /// Create or update a file. A stale `previous_sha` yields
    /// [`HostError::Conflict`].
    fn update_file(&self, repo: &RepoRef, update: &FileUpdate<'_>) -> Result<(), HostError>;

    /// Metadata for one commit (`reference` is a sha or branch name).
    fn fetch_commit(&self, repo: &RepoRef, reference: &str) -> Result<CommitInfo, HostError>;

    /// One page of commits on `branch`, newest first.
    fn list_commits(
        &self,
        repo: &RepoRef,
        branch: &BranchName,
        per_page: u32,
        page: u32,
    ) -> Result<Vec<CommitInfo>, HostError>;

    /// The newest `first` commits of `branch` via the GraphQL history query.
    fn commit_history(
        &self,
        repo: &RepoRef,
        branch: &BranchName,
        first: u32,
    ) -> Result<Vec<CommitInfo>, HostError>;
}
