//! Error types for marksync-renderer.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while rendering or patching marked sections.
#[derive(Debug, Error)]
pub enum PatchError {
    /// No `<!-- NAME_START -->` … `<!-- NAME_END -->` span in the document.
    #[error("no markers found for '{marker}' in {document}")]
    MarkerNotFound { marker: String, document: String },

    /// Two marker spans share bytes, so neither can be replaced in isolation.
    #[error("marker spans '{first}' and '{second}' overlap in {document}")]
    OverlappingMarkers {
        first: String,
        second: String,
        document: String,
    },

    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Marker pattern failed to compile.
    #[error("marker pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Filesystem error while loading a user template.
    #[error("template io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
