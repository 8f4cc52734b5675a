//! In-memory repository host that records every call.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use marksync_core::types::{BranchName, RepoRef};
use marksync_github::{CommitInfo, FileUpdate, HostError, RemoteFile, RepositoryHost};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub path: String,
    pub content: String,
    pub message: String,
    pub previous_sha: Option<String>,
    pub branch: String,
}

#[derive(Default)]
pub struct FakeHost {
    files: Mutex<HashMap<String, RemoteFile>>,
    /// Newest first; served by `list_commits` and `commit_history`.
    history: Vec<CommitInfo>,
    /// Served by `fetch_commit`, keyed by sha or branch name.
    commits: HashMap<String, CommitInfo>,
    fail_commit_lookup: bool,
    /// Paths whose writes are rejected as if someone else wrote first.
    contended: Vec<String>,
    calls: Mutex<Vec<String>>,
    writes: Mutex<Vec<RecordedWrite>>,
    next_sha: Mutex<u32>,
}

pub fn commit(sha: &str, message: &str, date: &str) -> CommitInfo {
    CommitInfo {
        sha: sha.to_string(),
        message: message.to_string(),
        date: date.to_string(),
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, content: &str, sha: &str) -> Self {
        self.files.lock().unwrap().insert(
            path.to_string(),
            RemoteFile {
                path: path.to_string(),
                content: content.to_string(),
                sha: sha.to_string(),
            },
        );
        self
    }

    pub fn with_commit(mut self, reference: &str, commit: CommitInfo) -> Self {
        self.commits.insert(reference.to_string(), commit);
        self
    }

    pub fn with_history(mut self, history: Vec<CommitInfo>) -> Self {
        self.history = history;
        self
    }

    pub fn failing_commit_lookup(mut self) -> Self {
        self.fail_commit_lookup = true;
        self
    }

    pub fn contended(mut self, path: &str) -> Self {
        self.contended.push(path.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().unwrap().clone()
    }

    pub fn file(&self, path: &str) -> Option<RemoteFile> {
        self.files.lock().unwrap().get(path).cloned()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl RepositoryHost for FakeHost {
    fn fetch_file(
        &self,
        _repo: &RepoRef,
        path: &str,
        _branch: &BranchName,
    ) -> Result<Option<RemoteFile>, HostError> {
        self.record(format!("fetch_file {path}"));
        Ok(self.file(path))
    }

    fn update_file(&self, _repo: &RepoRef, update: &FileUpdate<'_>) -> Result<(), HostError> {
        self.record(format!("update_file {}", update.path));
        self.writes.lock().unwrap().push(RecordedWrite {
            path: update.path.to_string(),
            content: update.content.to_string(),
            message: update.message.to_string(),
            previous_sha: update.previous_sha.map(str::to_string),
            branch: update.branch.0.clone(),
        });

        let mut files = self.files.lock().unwrap();
        let current = files.get(update.path).map(|f| f.sha.clone());
        if self.contended.iter().any(|p| p == update.path)
            || current.as_deref() != update.previous_sha
        {
            return Err(HostError::Conflict {
                path: update.path.to_string(),
                message: "HTTP 409: sha does not match".to_string(),
            });
        }

        let mut next = self.next_sha.lock().unwrap();
        *next += 1;
        files.insert(
            update.path.to_string(),
            RemoteFile {
                path: update.path.to_string(),
                content: update.content.to_string(),
                sha: format!("written-{next}"),
            },
        );
        Ok(())
    }

    fn fetch_commit(&self, _repo: &RepoRef, reference: &str) -> Result<CommitInfo, HostError> {
        self.record(format!("fetch_commit {reference}"));
        if self.fail_commit_lookup {
            return Err(HostError::Transport {
                operation: "fetch commit",
                message: "connection reset".to_string(),
            });
        }
        self.commits
            .get(reference)
            .cloned()
            .ok_or_else(|| HostError::Status {
                operation: "fetch commit",
                status: 404,
                message: format!("no commit {reference}"),
            })
    }

    fn list_commits(
        &self,
        _repo: &RepoRef,
        branch: &BranchName,
        per_page: u32,
        page: u32,
    ) -> Result<Vec<CommitInfo>, HostError> {
        self.record(format!("list_commits {branch} {per_page} {page}"));
        Ok(self.history.iter().take(per_page as usize).cloned().collect())
    }

    fn commit_history(
        &self,
        _repo: &RepoRef,
        branch: &BranchName,
        first: u32,
    ) -> Result<Vec<CommitInfo>, HostError> {
        self.record(format!("commit_history {branch} {first}"));
        Ok(self.history.iter().take(first as usize).cloned().collect())
    }
}
