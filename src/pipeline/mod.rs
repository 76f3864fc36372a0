//! Pipeline stages for transcript-to-LaTeX conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different splitting strategy) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ preprocess ──▶ split ──▶ classify ──▶ escape ──▶ render
//! (text)    (cleanup)      (sections) (line roles) (LaTeX)   (blocks)
//! ```
//!
//! 1. [`preprocess`] — deterministic cleanup of raw transcript text (line
//!    endings, invisible characters, blank-line runs)
//! 2. [`split`]      — partition the transcript into titled sections, by
//!    explicit `SECTION n:` headers or by keyword vocabulary
//! 3. [`classify`]   — assign each line a role (key/value, checkbox
//!    question, header, bullet, narrative)
//! 4. [`escape`]     — LaTeX-reserve-character escaping plus `\seqsplit`
//!    breaking of unbreakable identifier tokens
//! 5. [`render`]     — emit LaTeX blocks per section in the fixed order
//!    table → paragraphs → list
//!
//! Three collaborator stages sit outside the pure path and own all process
//! and network I/O:
//!
//! * [`ocr`]        — extract transcript text from scanned PDFs via the OCR
//!   service
//! * [`synthesize`] — merge multiple transcripts into one tagged report via
//!   the synthesis model
//! * [`compile`]    — run `pdflatex` on the rendered `.tex`

pub mod classify;
pub mod compile;
pub mod escape;
pub mod ocr;
pub mod preprocess;
pub mod render;
pub mod split;
pub mod synthesize;
