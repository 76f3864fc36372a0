//! Output types returned by the conversion entry points.
//!
//! [`ConversionOutput`] is the single-document result; [`BatchOutput`]
//! wraps one [`DocumentResult`] per input file so batch callers can inspect
//! partial success. All types serialise to JSON for the CLI's `--json`
//! mode and for archival next to the rendered `.tex` files.

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of converting one transcript to LaTeX.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The complete LaTeX document, preamble through `\end{document}`.
    pub latex: String,
    /// Structural tallies gathered during rendering.
    pub stats: DocumentStats,
}

/// Structural statistics for one converted document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Sections emitted (always ≥ 1 for non-empty input).
    pub sections: usize,
    /// Key/value rows rendered into tables or bold pairs.
    pub table_rows: usize,
    /// Narrative paragraphs emitted.
    pub paragraphs: usize,
    /// Checkbox questions normalised and listed.
    pub checkbox_items: usize,
    /// Bullet items in the tagged-report variant.
    pub list_items: usize,
    /// Length of the cleaned input in characters.
    pub input_chars: usize,
    /// Length of the emitted LaTeX in characters.
    pub latex_chars: usize,
    /// Wall-clock conversion time in milliseconds.
    pub duration_ms: u64,
}

/// Per-document outcome inside a batch.
///
/// Exactly one of `output` and `error` is `Some`; a failed document keeps
/// its slot so callers can see which input produced which outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    /// Source transcript path.
    pub input: PathBuf,
    /// Rendered `.tex` path, present on success.
    pub output: Option<PathBuf>,
    /// Render statistics, present on success.
    pub stats: Option<DocumentStats>,
    /// Failure detail, present on error.
    pub error: Option<DocumentError>,
}

impl DocumentResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a batch conversion over a directory of transcripts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput {
    /// One entry per input file, in discovery order.
    pub documents: Vec<DocumentResult>,
    /// Aggregate tallies across the batch.
    pub stats: BatchStats,
}

/// Aggregate statistics for a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Wall-clock time for the whole batch in milliseconds.
    pub duration_ms: u64,
}
