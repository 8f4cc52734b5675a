use std::fs;

use chrono::NaiveDate;
use marksync_core::types::{ActivityFact, FailureKind, MarkerName};
use marksync_renderer::SectionPatcher;
use marksync_sync::writer::backup_path;
use marksync_sync::{ensure_markers, update_document, LocalUpdate, SyncError, WriteResult};
use tempfile::TempDir;

const DOC: &str = "# Title\n\n<!-- AUTO_SECTION_START -->\nold\n<!-- AUTO_SECTION_END -->\n";

fn fact(day: u32) -> ActivityFact {
    let ts = NaiveDate::from_ymd_opt(2025, 6, day)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    ActivityFact::new(ts, None)
}

fn auto_section() -> Vec<MarkerName> {
    vec![MarkerName::from("AUTO_SECTION")]
}

#[test]
fn update_writes_section_and_backup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("README.md");
    fs::write(&path, DOC).unwrap();
    let markers = auto_section();

    let result = update_document(
        &LocalUpdate {
            path: &path,
            markers: &markers,
            status: "✅",
            dry_run: false,
        },
        &fact(5),
        &SectionPatcher::new().unwrap(),
    )
    .unwrap();

    assert!(matches!(result, WriteResult::Written { .. }));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "# Title\n\n<!-- AUTO_SECTION_START -->\n- Last updated: 2025-06-05 09:30:00\n- Deployment status: ✅\n<!-- AUTO_SECTION_END -->\n"
    );
    assert_eq!(fs::read_to_string(backup_path(&path)).unwrap(), DOC);
}

#[test]
fn second_run_with_same_fact_is_unchanged() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("README.md");
    fs::write(&path, DOC).unwrap();
    let markers = auto_section();
    let request = LocalUpdate {
        path: &path,
        markers: &markers,
        status: "success",
        dry_run: false,
    };
    let patcher = SectionPatcher::new().unwrap();

    update_document(&request, &fact(5), &patcher).unwrap();
    let result = update_document(&request, &fact(5), &patcher).unwrap();
    assert!(matches!(result, WriteResult::Unchanged { .. }));
    assert_eq!(fs::read_to_string(backup_path(&path)).unwrap(), DOC);
}

#[test]
fn newer_fact_overwrites_backup_with_previous_content() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("README.md");
    fs::write(&path, DOC).unwrap();
    let markers = auto_section();
    let request = LocalUpdate {
        path: &path,
        markers: &markers,
        status: "success",
        dry_run: false,
    };
    let patcher = SectionPatcher::new().unwrap();

    update_document(&request, &fact(5), &patcher).unwrap();
    let after_first = fs::read_to_string(&path).unwrap();
    update_document(&request, &fact(6), &patcher).unwrap();

    assert_eq!(fs::read_to_string(backup_path(&path)).unwrap(), after_first);
    assert!(fs::read_to_string(&path).unwrap().contains("2025-06-06 09:30:00"));
}

#[test]
fn missing_marker_leaves_file_and_creates_no_backup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("README.md");
    fs::write(&path, "# No markers\n").unwrap();
    let markers = auto_section();

    let err = update_document(
        &LocalUpdate {
            path: &path,
            markers: &markers,
            status: "success",
            dry_run: false,
        },
        &fact(5),
        &SectionPatcher::new().unwrap(),
    )
    .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Configuration);
    assert!(err.to_string().contains("AUTO_SECTION"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "# No markers\n");
    assert!(!backup_path(&path).exists());
}

#[test]
fn dry_run_leaves_disk_alone() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("README.md");
    fs::write(&path, DOC).unwrap();
    let markers = auto_section();

    let result = update_document(
        &LocalUpdate {
            path: &path,
            markers: &markers,
            status: "success",
            dry_run: true,
        },
        &fact(5),
        &SectionPatcher::new().unwrap(),
    )
    .unwrap();

    assert!(matches!(result, WriteResult::WouldWrite { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), DOC);
    assert!(!backup_path(&path).exists());
}

#[test]
fn missing_document_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.md");
    let markers = auto_section();

    let err = update_document(
        &LocalUpdate {
            path: &path,
            markers: &markers,
            status: "success",
            dry_run: false,
        },
        &fact(5),
        &SectionPatcher::new().unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, SyncError::DocumentNotFound { .. }));
}

#[test]
fn ensure_markers_checks_document_without_writing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("README.md");
    fs::write(&path, DOC).unwrap();
    let present = auto_section();
    let missing = vec![MarkerName::from("AUTO_SECTION"), MarkerName::from("CHANGELOG")];

    ensure_markers(&LocalUpdate {
        path: &path,
        markers: &present,
        status: "ok",
        dry_run: false,
    })
    .unwrap();

    let err = ensure_markers(&LocalUpdate {
        path: &path,
        markers: &missing,
        status: "ok",
        dry_run: false,
    })
    .unwrap_err();
    assert!(err.to_string().contains("no markers found for 'CHANGELOG'"));
    assert_eq!(err.kind(), FailureKind::Configuration);
    assert_eq!(fs::read_to_string(&path).unwrap(), DOC);
    assert!(!backup_path(&path).exists());

    let absent = dir.path().join("MISSING.md");
    let err = ensure_markers(&LocalUpdate {
        path: &absent,
        markers: &present,
        status: "ok",
        dry_run: false,
    })
    .unwrap_err();
    assert!(matches!(err, SyncError::DocumentNotFound { .. }));
}
