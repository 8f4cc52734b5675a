//! Tera rendering engine for the metadata block placed between markers.
//!
//! The embedded template produces:
//!
//! ```text
//! - Last updated: 2025-06-05 12:34:56
//! - Commit message: Fix all the bugs      (only when a message is known)
//! - Deployment status: success
//! ```
//!
//! Operators may replace it with their own `.tera` file; every non-blank
//! output line becomes one metadata line.

use std::path::{Path, PathBuf};

use tera::Tera;

use crate::context::SectionContext;
use crate::error::PatchError;

const SECTION_TEMPLATE_NAME: &str = "section.md.tera";

const DEFAULT_SECTION_TEMPLATE: &str = "\
- Last updated: {{ last_updated }}
{% if commit_message %}- Commit message: {{ commit_message }}
{% endif %}- Deployment status: {{ status }}
";

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> PatchError {
    PatchError::Io {
        path: path.into(),
        source,
    }
}

fn build_tera(template: &str) -> Result<Tera, PatchError> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera.add_raw_template(SECTION_TEMPLATE_NAME, template)?;
    Ok(tera)
}

/// Renders the metadata lines for one marked section.
///
/// Create once and reuse; rendering is pure.
pub struct SectionRenderer {
    tera: Tera,
}

impl SectionRenderer {
    /// Renderer using the embedded template.
    pub fn new() -> Result<Self, PatchError> {
        Ok(Self {
            tera: build_tera(DEFAULT_SECTION_TEMPLATE)?,
        })
    }

    /// Renderer using a template loaded from `path`.
    pub fn from_template_file(path: &Path) -> Result<Self, PatchError> {
        let template = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        Ok(Self {
            tera: build_tera(&template)?,
        })
    }

    /// Renderer from an optional override path.
    pub fn with_override(path: Option<&Path>) -> Result<Self, PatchError> {
        match path {
            Some(path) => Self::from_template_file(path),
            None => Self::new(),
        }
    }

    /// Render the metadata lines, one entry per line, blank lines dropped.
    pub fn render_lines(&self, ctx: &SectionContext) -> Result<Vec<String>, PatchError> {
        let tera_ctx = ctx.to_tera_context()?;
        let rendered = self.tera.render(SECTION_TEMPLATE_NAME, &tera_ctx)?;
        Ok(rendered
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}
