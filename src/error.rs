//! Error types for the med2tex library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Med2TexError`] — **Fatal**: the conversion cannot proceed at all
//!   (bad input path, invalid config, every document failed). Returned as
//!   `Err(Med2TexError)` from the top-level `convert*` functions.
//!
//! * [`DocumentError`] — **Non-fatal**: a single document in a batch failed
//!   (unreadable file, write error) but the others are fine. Stored inside
//!   [`crate::output::DocumentResult`] so callers can inspect partial
//!   success rather than losing the whole batch to one bad file.
//!
//! The separation lets callers decide their own tolerance: abort on the
//! first document failure, log and continue, or collect all errors for a
//! post-run report.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the med2tex library.
///
/// Document-level failures use [`DocumentError`] and are stored in
/// [`crate::output::DocumentResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Med2TexError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input path was not found.
    #[error("Input not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// Process does not have read permission on the input.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input path is neither a transcript file nor a directory of them.
    #[error("Invalid input '{path}': expected a .txt transcript or a directory containing them")]
    InvalidInput { path: PathBuf },

    /// The input exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── OCR service errors ────────────────────────────────────────────────
    /// The OCR service did not answer its health check.
    #[error("OCR service unreachable at '{url}': {reason}\nStart the service or point --ocr-url at a running instance.")]
    OcrUnavailable { url: String, reason: String },

    /// The OCR service accepted the request but extraction failed.
    #[error("OCR extraction failed for '{path}': {detail}")]
    OcrFailed { path: PathBuf, detail: String },

    // ── Synthesis errors ──────────────────────────────────────────────────
    /// No API key available for the synthesis model.
    #[error("Synthesis model is not configured.\n{hint}")]
    SynthesisNotConfigured { hint: String },

    /// The synthesis API returned a non-retryable error or exhausted retries.
    #[error("Synthesis failed after {retries} retries: {detail}")]
    SynthesisFailed { retries: u32, detail: String },

    // ── Compile errors ────────────────────────────────────────────────────
    /// The LaTeX compiler binary could not be spawned.
    #[error("LaTeX compiler '{path}' not found: {reason}\nInstall TeX Live or point --pdflatex at the binary.")]
    CompilerNotFound { path: String, reason: String },

    /// The compiler ran but produced no PDF.
    #[error("pdflatex produced no PDF for '{tex_path}'\nLog tail:\n{log_tail}")]
    CompileFailed { tex_path: PathBuf, log_tail: String },

    // ── Batch errors ──────────────────────────────────────────────────────
    /// Every document in the batch failed; output would be empty.
    #[error("All {total} documents failed.\nFirst error: {first_error}")]
    AllDocumentsFailed { total: usize, first_error: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single document in a batch.
///
/// Stored alongside [`crate::output::DocumentResult`] when a document
/// fails. The overall batch continues unless ALL documents fail.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// The transcript file could not be read.
    #[error("'{path}': read failed: {detail}")]
    ReadFailed { path: PathBuf, detail: String },

    /// The rendered output could not be written.
    #[error("'{path}': write failed: {detail}")]
    WriteFailed { path: PathBuf, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_documents_failed_display() {
        let e = Med2TexError::AllDocumentsFailed {
            total: 4,
            first_error: "'a.txt': read failed: no such file".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("All 4 documents failed"), "got: {msg}");
        assert!(msg.contains("a.txt"), "got: {msg}");
    }

    #[test]
    fn ocr_unavailable_carries_hint() {
        let e = Med2TexError::OcrUnavailable {
            url: "http://localhost:8000".into(),
            reason: "connection refused".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("localhost:8000"), "got: {msg}");
        assert!(msg.contains("--ocr-url"), "got: {msg}");
    }

    #[test]
    fn synthesis_not_configured_carries_hint() {
        let e = Med2TexError::SynthesisNotConfigured {
            hint: "Set GEMINI_API_KEY in the environment.".into(),
        };
        assert!(e.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn document_error_display() {
        let e = DocumentError::ReadFailed {
            path: PathBuf::from("notes.txt"),
            detail: "permission denied".into(),
        };
        assert!(e.to_string().contains("notes.txt"));
        assert!(e.to_string().contains("permission denied"));
    }
}
