//! # med2tex
//!
//! Render OCR and LLM-synthesized medical transcripts into structured LaTeX
//! reports.
//!
//! ## Why this crate?
//!
//! Transcripts of scanned medical forms are structurally messy — section
//! headers survive OCR but tables, checkboxes, and field layout do not. A
//! checkbox comes back as noise like `M No` or `OO Yes`; a form field is
//! just a `Key: Value` line adrift in prose. This crate classifies each
//! line of a transcript by shape and re-renders the document as typeset
//! LaTeX: key/value fields as tables, checkbox answers as canonical
//! `\checkbox`/`\checkedbox` list items, prose as paragraphs.
//!
//! ## Pipeline Overview
//!
//! ```text
//! transcript text
//!  │
//!  ├─ 1. Preprocess  line endings, invisible chars, blank-line runs
//!  ├─ 2. Split       `SECTION n:` headers or keyword vocabulary
//!  ├─ 3. Classify    key/value · checkbox · header · bullet · narrative
//!  ├─ 4. Escape      LaTeX reserved chars + \seqsplit identifier breaking
//!  ├─ 5. Render      table → paragraphs → list per section
//!  └─ 6. Output      complete .tex document + structural stats
//! ```
//!
//! Two renderers cover the two transcript shapes: freeform OCR output
//! (heuristic line classification) and the markdown-tagged report the
//! synthesis model produces (`**SECTION n: …**` headers, `*` bullets).
//! [`workflow::run`] chains the external collaborators — OCR service,
//! synthesis model, `pdflatex` — into one end-to-end run.
//!
//! ## Quick Start
//!
//! ```rust
//! use med2tex::{convert_text, ConversionConfig};
//!
//! let config = ConversionConfig::builder()
//!     .title("Consultation Notes")
//!     .build()
//!     .unwrap();
//!
//! let transcript = "SECTION 1: PATIENT PARTICULARS\n\
//!                   Name: Jane Doe\n\
//!                   Age: 45\n\
//!                   Pain present: M No";
//! let output = convert_text(transcript, &config);
//! assert!(output.latex.contains("Name & Jane Doe"));
//! assert!(output.latex.contains("\\checkbox~No"));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `med2tex` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! med2tex = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;
pub mod templates;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, SourceShape, SplitStrategy};
pub use convert::{convert_dir, convert_file, convert_text, render_freeform_sections, render_tagged_report};
pub use error::{DocumentError, Med2TexError};
pub use output::{BatchOutput, BatchStats, ConversionOutput, DocumentResult, DocumentStats};
pub use pipeline::classify::{CheckboxLexicon, CheckboxRule, ClassifiedLine, KeyValueLimits};
pub use pipeline::split::{Section, SectionVocabulary};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{convert_dir_stream, DocumentStream};
pub use workflow::{Stage, StageReport, StageStatus, WorkflowReport};
