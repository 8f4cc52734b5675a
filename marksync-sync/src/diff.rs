//! Unified diff preview for `marksync diff`.

use similar::TextDiff;

use marksync_core::types::ActivityFact;
use marksync_renderer::SectionPatcher;

use crate::standalone::{read_document, render_update, LocalUpdate};
use crate::SyncError;

/// Unified diff between `before` and `after`, labelled `a/<name>`/`b/<name>`.
pub fn unified_diff(name: &str, before: &str, after: &str) -> String {
    let old_header = format!("a/{name}");
    let new_header = format!("b/{name}");
    TextDiff::from_lines(before, after)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string()
}

/// What `update` would change, without writing anything.
///
/// `None` when the document is already current.
pub fn diff_document(
    request: &LocalUpdate<'_>,
    fact: &ActivityFact,
    patcher: &SectionPatcher,
) -> Result<Option<String>, SyncError> {
    let original = read_document(request.path)?;
    let Some(updated) = render_update(request, &original, fact, patcher)? else {
        return Ok(None);
    };
    let name = request.path.display().to_string();
    Ok(Some(unified_diff(&name, &original, &updated)))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::NaiveDate;
    use marksync_core::types::MarkerName;
    use tempfile::TempDir;

    use super::*;

    fn fact() -> ActivityFact {
        let ts = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        ActivityFact::new(ts, Some("Initial import"))
    }

    #[test]
    fn diff_shows_replaced_lines_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("README.md");
        let doc = "# Title\n<!-- AUTO_SECTION_START -->\nold\n<!-- AUTO_SECTION_END -->\n";
        fs::write(&path, doc).unwrap();

        let markers = vec![MarkerName::from("AUTO_SECTION")];
        let request = LocalUpdate {
            path: &path,
            markers: &markers,
            status: "success",
            dry_run: false,
        };
        let diff = diff_document(&request, &fact(), &SectionPatcher::new().unwrap())
            .unwrap()
            .expect("document should change");

        assert!(diff.contains("-old\n"));
        assert!(diff.contains("+- Last updated: 2025-01-01 00:00:00\n"));
        assert!(diff.contains("+- Commit message: Initial import\n"));
        assert_eq!(fs::read_to_string(&path).unwrap(), doc);
    }

    #[test]
    fn current_document_has_no_diff() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("README.md");
        fs::write(
            &path,
            "<!-- AUTO_SECTION_START -->\n- Last updated: 2025-01-01 00:00:00\n- Commit message: Initial import\n- Deployment status: success\n<!-- AUTO_SECTION_END -->\n",
        )
        .unwrap();

        let markers = vec![MarkerName::from("AUTO_SECTION")];
        let request = LocalUpdate {
            path: &path,
            markers: &markers,
            status: "success",
            dry_run: false,
        };
        let diff = diff_document(&request, &fact(), &SectionPatcher::new().unwrap()).unwrap();
        assert!(diff.is_none());
    }
}
