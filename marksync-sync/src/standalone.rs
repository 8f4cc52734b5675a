//! Standalone mode: patch a document on disk without a webhook.
//!
//! No signature, no event gate, no anti-loop guard. The caller supplies the
//! activity fact (local clock or a repository lookup).

use std::io::ErrorKind;
use std::path::Path;

use marksync_core::types::{ActivityFact, MarkerName};
use marksync_renderer::{locate_sections, PatchOutcome, SectionContext, SectionPatcher};

use crate::error::{io_err, SyncError};
use crate::writer::{persist_local, WriteResult};

/// One manual update request.
#[derive(Debug, Clone, Copy)]
pub struct LocalUpdate<'a> {
    pub path: &'a Path,
    pub markers: &'a [MarkerName],
    pub status: &'a str,
    pub dry_run: bool,
}

pub(crate) fn read_document(path: &Path) -> Result<String, SyncError> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            SyncError::DocumentNotFound {
                path: path.display().to_string(),
                location: "local disk".to_string(),
            }
        } else {
            io_err(path, e)
        }
    })
}

/// Read `request.path` and check every marker has its own span.
///
/// Lets callers report a missing document or marker before any costly
/// lookup of the activity fact.
pub fn ensure_markers(request: &LocalUpdate<'_>) -> Result<(), SyncError> {
    let document = read_document(request.path)?;
    let label = request.path.display().to_string();
    locate_sections(&document, &label, request.markers)?;
    Ok(())
}

/// Content `request` would produce, or `None` when nothing would change.
pub(crate) fn render_update(
    request: &LocalUpdate<'_>,
    original: &str,
    fact: &ActivityFact,
    patcher: &SectionPatcher,
) -> Result<Option<String>, SyncError> {
    let ctx = SectionContext::new(fact, request.status);
    let label = request.path.display().to_string();
    match patcher.patch(original, &label, request.markers, &ctx)? {
        PatchOutcome::Unchanged => Ok(None),
        PatchOutcome::Changed { content } => Ok(Some(content)),
    }
}

/// Patch every marker in `request.path` and persist with a backup.
pub fn update_document(
    request: &LocalUpdate<'_>,
    fact: &ActivityFact,
    patcher: &SectionPatcher,
) -> Result<WriteResult, SyncError> {
    let original = read_document(request.path)?;
    match render_update(request, &original, fact, patcher)? {
        None => {
            tracing::info!("unchanged: {}", request.path.display());
            Ok(WriteResult::Unchanged {
                path: request.path.to_path_buf(),
            })
        }
        Some(updated) => persist_local(request.path, &original, &updated, request.dry_run),
    }
}
