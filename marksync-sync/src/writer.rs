//! Persistence guard: backup first, then the patched document.
//!
//! ## Local protocol
//!
//! 1. Skip if patched content equals the original.
//! 2. Write the original to `<file>.bak` and fsync it.
//! 3. Write the patched content to `<file>.marksync.tmp` and fsync it.
//! 4. Rename the tmp file over `<file>` (atomic on POSIX). On failure the
//!    tmp file is removed and `<file>` is left untouched.
//!
//! ## Remote protocol
//!
//! 1. Look up `<path>.bak` to learn its revision token, if any.
//! 2. Put the original content to `<path>.bak`.
//! 3. Put the patched content to `<path>` conditioned on the token that was
//!    read with the original. A stale token is a
//!    [`SyncError::Conflict`], never retried.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use marksync_core::types::{BranchName, RepoRef};
use marksync_github::{FileUpdate, RemoteFile, RepositoryHost};

use crate::error::{io_err, SyncError};

/// Suffix of the single-generation backup kept next to the document.
pub const BACKUP_SUFFIX: &str = ".bak";

const TMP_SUFFIX: &str = ".marksync.tmp";

// ---------------------------------------------------------------------------
// Write result
// ---------------------------------------------------------------------------

/// Outcome of persisting one document locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// Backup and document were both written.
    Written { path: PathBuf, backup: PathBuf },
    /// Patched content equals the original; nothing touched.
    Unchanged { path: PathBuf },
    /// `--dry-run` mode: the document *would* have been written.
    WouldWrite { path: PathBuf },
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// `<file>.bak`
pub fn backup_path(path: &Path) -> PathBuf {
    with_suffix(path, BACKUP_SUFFIX)
}

/// Remote counterpart of [`backup_path`].
pub fn remote_backup_path(path: &str) -> String {
    format!("{path}{BACKUP_SUFFIX}")
}

fn tmp_path(path: &Path) -> PathBuf {
    with_suffix(path, TMP_SUFFIX)
}

fn write_synced(path: &Path, content: &str) -> Result<(), SyncError> {
    let mut file = File::create(path).map_err(|e| io_err(path, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| io_err(path, e))?;
    file.sync_all().map_err(|e| io_err(path, e))
}

// ---------------------------------------------------------------------------
// Local
// ---------------------------------------------------------------------------

/// Persist a patched document on disk, keeping the previous content in
/// `<file>.bak`.
pub fn persist_local(
    path: &Path,
    original: &str,
    updated: &str,
    dry_run: bool,
) -> Result<WriteResult, SyncError> {
    persist_local_with(path, original, updated, dry_run, &backup_path(path), &tmp_path(path))
}

fn persist_local_with(
    path: &Path,
    original: &str,
    updated: &str,
    dry_run: bool,
    backup: &Path,
    tmp: &Path,
) -> Result<WriteResult, SyncError> {
    if original == updated {
        tracing::debug!("unchanged: {}", path.display());
        return Ok(WriteResult::Unchanged {
            path: path.to_path_buf(),
        });
    }

    if dry_run {
        tracing::info!("[dry-run] would write: {}", path.display());
        return Ok(WriteResult::WouldWrite {
            path: path.to_path_buf(),
        });
    }

    write_synced(backup, original)?;
    tracing::debug!("backup written: {}", backup.display());

    write_synced(tmp, updated)?;
    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::info!("wrote: {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
        backup: backup.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Remote
// ---------------------------------------------------------------------------

/// Commit messages for the two remote writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessages {
    pub backup: String,
    pub update: String,
}

/// Persist a patched document through the host, backup first.
///
/// `original` must be the file exactly as read before patching; its `sha`
/// is the revision token the update is conditioned on.
pub fn persist_remote<H>(
    host: &H,
    repo: &RepoRef,
    branch: &BranchName,
    original: &RemoteFile,
    updated: &str,
    messages: &CommitMessages,
) -> Result<(), SyncError>
where
    H: RepositoryHost + ?Sized,
{
    let backup = remote_backup_path(&original.path);
    let existing = host.fetch_file(repo, &backup, branch)?;

    host.update_file(
        repo,
        &FileUpdate {
            path: &backup,
            content: &original.content,
            message: &messages.backup,
            previous_sha: existing.as_ref().map(|f| f.sha.as_str()),
            branch,
        },
    )?;
    tracing::debug!("backup written: {repo}@{branch}:{backup}");

    host.update_file(
        repo,
        &FileUpdate {
            path: &original.path,
            content: updated,
            message: &messages.update,
            previous_sha: Some(&original.sha),
            branch,
        },
    )?;
    tracing::info!("wrote: {repo}@{branch}:{}", original.path);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
