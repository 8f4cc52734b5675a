//! Marker locate/replace engine.
//!
//! ## Patch protocol
//!
//! 1. For each distinct marker name, build `<!-- NAME_START -->` and
//!    `<!-- NAME_END -->` and escape them into a non-greedy, dot-all pattern.
//! 2. Locate the first span start..=end in the *input* document. A missing
//!    span aborts with [`PatchError::MarkerNotFound`], overlapping spans with
//!    [`PatchError::OverlappingMarkers`]; the input is never partially patched.
//! 3. Splice each span (markers included) with start token, metadata lines,
//!    end token, from the last span to the first so earlier offsets hold.
//!    `<!--` inside a metadata line is written as `&lt;!--`, so no line can
//!    carry a marker token into the output.
//! 4. Compare the result with the input → [`PatchOutcome::Unchanged`] if
//!    byte-identical.

use std::ops::Range;

use regex::Regex;

use marksync_core::types::MarkerName;

use crate::context::SectionContext;
use crate::engine::SectionRenderer;
use crate::error::PatchError;

/// Result of patching a document in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// Rendered document equals the input; callers must skip the write.
    Unchanged,
    /// Rendered document differs from the input.
    Changed { content: String },
}

fn marker_pattern(marker: &MarkerName) -> Result<Regex, PatchError> {
    let pattern = format!(
        "(?s){}.*?{}",
        regex::escape(&marker.start_token()),
        regex::escape(&marker.end_token())
    );
    Ok(Regex::new(&pattern)?)
}

/// Byte range of the first `start..=end` span for `marker`, markers included.
pub fn locate(document: &str, marker: &MarkerName) -> Result<Option<Range<usize>>, PatchError> {
    let pattern = marker_pattern(marker)?;
    Ok(pattern.find(document).map(|m| m.range()))
}

/// Neutralise HTML comment openers so a line can never read as a marker.
fn sanitize_line(line: &str) -> String {
    line.replace("<!--", "&lt;!--")
}

fn render_block(marker: &MarkerName, lines: &[String]) -> String {
    let mut block = marker.start_token();
    block.push('\n');
    for line in lines {
        block.push_str(&sanitize_line(line));
        block.push('\n');
    }
    block.push_str(&marker.end_token());
    block
}

/// Spans of every distinct marker in `document`, ordered by offset.
///
/// Fails with [`PatchError::MarkerNotFound`] for the first marker without a
/// span and with [`PatchError::OverlappingMarkers`] when two spans share bytes.
pub fn locate_sections<'m>(
    document: &str,
    document_label: &str,
    markers: &'m [MarkerName],
) -> Result<Vec<(Range<usize>, &'m MarkerName)>, PatchError> {
    let mut spans: Vec<(Range<usize>, &MarkerName)> = Vec::with_capacity(markers.len());
    for marker in markers {
        if spans.iter().any(|(_, seen)| *seen == marker) {
            continue;
        }
        let span = locate(document, marker)?.ok_or_else(|| PatchError::MarkerNotFound {
            marker: marker.0.clone(),
            document: document_label.to_string(),
        })?;
        spans.push((span, marker));
    }

    spans.sort_by_key(|(span, _)| span.start);
    for pair in spans.windows(2) {
        let (first, first_marker) = &pair[0];
        let (second, second_marker) = &pair[1];
        if first.end > second.start {
            return Err(PatchError::OverlappingMarkers {
                first: first_marker.0.clone(),
                second: second_marker.0.clone(),
                document: document_label.to_string(),
            });
        }
    }
    Ok(spans)
}

/// Replace every named section using `render` to produce its metadata lines.
///
/// `document_label` names the document in [`PatchError::MarkerNotFound`].
pub fn replace_sections<F>(
    document: &str,
    document_label: &str,
    markers: &[MarkerName],
    mut render: F,
) -> Result<PatchOutcome, PatchError>
where
    F: FnMut(&MarkerName) -> Result<Vec<String>, PatchError>,
{
    let spans = locate_sections(document, document_label, markers)?;

    let mut blocks = Vec::with_capacity(spans.len());
    for (span, marker) in spans {
        blocks.push((span, render_block(marker, &render(marker)?)));
    }

    let mut patched = document.to_string();
    for (span, block) in blocks.into_iter().rev() {
        patched.replace_range(span, &block);
    }

    if patched == document {
        Ok(PatchOutcome::Unchanged)
    } else {
        Ok(PatchOutcome::Changed { content: patched })
    }
}

/// Template-backed patcher; the usual entrypoint.
pub struct SectionPatcher {
    renderer: SectionRenderer,
}

impl SectionPatcher {
    /// Patcher using the embedded section template.
    pub fn new() -> Result<Self, PatchError> {
        Ok(Self {
            renderer: SectionRenderer::new()?,
        })
    }

    pub fn with_renderer(renderer: SectionRenderer) -> Self {
        Self { renderer }
    }

    /// Patch every marker in `markers` with the same context.
    pub fn patch(
        &self,
        document: &str,
        document_label: &str,
        markers: &[MarkerName],
        ctx: &SectionContext,
    ) -> Result<PatchOutcome, PatchError> {
        let lines = self.renderer.render_lines(ctx)?;
        replace_sections(document, document_label, markers, |_| Ok(lines.clone()))
    }
}
