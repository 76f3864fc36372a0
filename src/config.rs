//! Configuration types for transcript-to-LaTeX conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across tasks, log them, and diff two runs to
//! understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A fifteen-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::Med2TexError;
use crate::pipeline::classify::{CheckboxLexicon, KeyValueLimits};
use crate::pipeline::split::SectionVocabulary;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for a transcript-to-LaTeX conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use med2tex::{ConversionConfig, SplitStrategy};
///
/// let config = ConversionConfig::builder()
///     .title("Consultation Notes")
///     .split_strategy(SplitStrategy::Keywords)
///     .concurrency(4)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Which upstream text shape the input carries. Default: [`SourceShape::Auto`].
    ///
    /// `Auto` sniffs the input: text containing a `**SECTION` tag is treated
    /// as a synthesized tagged report, anything else as freeform sections.
    pub shape: SourceShape,

    /// How to partition freeform text into sections. Default: [`SplitStrategy::Headers`].
    pub split: SplitStrategy,

    /// Document title for the preamble. Default: "Medical Report".
    pub title: String,

    /// Document author for the preamble. Default: "Automated Transcription".
    pub author: String,

    /// Section vocabulary for the keyword splitting strategy.
    pub vocabulary: SectionVocabulary,

    /// OCR checkbox-noise lexicon for the freeform classifier.
    pub lexicon: CheckboxLexicon,

    /// Key/value heuristic limits for the freeform classifier.
    ///
    /// A line with exactly one colon splits into key/value only when the key
    /// stays under `max_key_chars` and the value under `max_value_chars`;
    /// longer spans read as narrative prose that happens to contain a colon.
    pub limits: KeyValueLimits,

    /// Value length above which a report key/value line wraps onto its own
    /// `\parbox` line. Measured in characters of the escaped value. Default: 60.
    pub wrap_threshold: usize,

    /// Timestamp stamped into the report footer. `None` means "now" at
    /// render time; tests pin it for deterministic output.
    pub generated_at: Option<String>,

    /// Number of documents converted concurrently in batch mode. Default: 8.
    ///
    /// Conversion itself is CPU-cheap; the bound matters when the batch path
    /// reads and writes many files at once.
    pub concurrency: usize,

    /// Base URL of the OCR service. Default: "http://localhost:8000".
    pub ocr_url: String,

    /// Per-document OCR request timeout in seconds. Default: 300.
    ///
    /// OCR of a scanned multi-page PDF routinely takes minutes; a short
    /// timeout here turns slow-but-successful extractions into failures.
    pub ocr_timeout_secs: u64,

    /// Synthesis model identifier. Default: "gemini-2.0-flash".
    pub synthesis_model: String,

    /// Per-call synthesis request timeout in seconds. Default: 120.
    pub synthesis_timeout_secs: u64,

    /// Maximum retry attempts on a transient synthesis API failure. Default: 3.
    ///
    /// Most 5xx and timeout errors are transient. Permanent errors (bad API
    /// key, 400) are not retried and surface immediately.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    ///
    /// Doubles after each attempt: 500 ms → 1 s → 2 s.
    pub retry_backoff_ms: u64,

    /// Path to the `pdflatex` binary. Default: "pdflatex" (resolved via PATH).
    pub pdflatex_path: String,

    /// Progress callback for batch conversion. Default: no-op.
    pub progress: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            shape: SourceShape::Auto,
            split: SplitStrategy::Headers,
            title: "Medical Report".to_string(),
            author: "Automated Transcription".to_string(),
            vocabulary: SectionVocabulary::default(),
            lexicon: CheckboxLexicon::default(),
            limits: KeyValueLimits::default(),
            wrap_threshold: 60,
            generated_at: None,
            concurrency: 8,
            ocr_url: "http://localhost:8000".to_string(),
            ocr_timeout_secs: 300,
            synthesis_model: "gemini-2.0-flash".to_string(),
            synthesis_timeout_secs: 120,
            max_retries: 3,
            retry_backoff_ms: 500,
            pdflatex_path: "pdflatex".to_string(),
            progress: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("shape", &self.shape)
            .field("split", &self.split)
            .field("title", &self.title)
            .field("author", &self.author)
            .field("wrap_threshold", &self.wrap_threshold)
            .field("generated_at", &self.generated_at)
            .field("concurrency", &self.concurrency)
            .field("ocr_url", &self.ocr_url)
            .field("synthesis_model", &self.synthesis_model)
            .field("max_retries", &self.max_retries)
            .field("pdflatex_path", &self.pdflatex_path)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn shape(mut self, shape: SourceShape) -> Self {
        self.config.shape = shape;
        self
    }

    pub fn split_strategy(mut self, split: SplitStrategy) -> Self {
        self.config.split = split;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.config.author = author.into();
        self
    }

    pub fn vocabulary(mut self, vocabulary: SectionVocabulary) -> Self {
        self.config.vocabulary = vocabulary;
        self
    }

    pub fn lexicon(mut self, lexicon: CheckboxLexicon) -> Self {
        self.config.lexicon = lexicon;
        self
    }

    pub fn limits(mut self, limits: KeyValueLimits) -> Self {
        self.config.limits = limits;
        self
    }

    pub fn wrap_threshold(mut self, chars: usize) -> Self {
        self.config.wrap_threshold = chars.max(1);
        self
    }

    pub fn generated_at(mut self, timestamp: impl Into<String>) -> Self {
        self.config.generated_at = Some(timestamp.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn ocr_url(mut self, url: impl Into<String>) -> Self {
        self.config.ocr_url = url.into();
        self
    }

    pub fn ocr_timeout_secs(mut self, secs: u64) -> Self {
        self.config.ocr_timeout_secs = secs;
        self
    }

    pub fn synthesis_model(mut self, model: impl Into<String>) -> Self {
        self.config.synthesis_model = model.into();
        self
    }

    pub fn synthesis_timeout_secs(mut self, secs: u64) -> Self {
        self.config.synthesis_timeout_secs = secs;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn pdflatex_path(mut self, path: impl Into<String>) -> Self {
        self.config.pdflatex_path = path.into();
        self
    }

    pub fn progress(mut self, callback: ProgressCallback) -> Self {
        self.config.progress = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Med2TexError> {
        let c = &self.config;
        if c.title.trim().is_empty() {
            return Err(Med2TexError::InvalidConfig(
                "Document title must not be empty".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(Med2TexError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.limits.max_key_chars == 0 || c.limits.max_value_chars == 0 {
            return Err(Med2TexError::InvalidConfig(
                "Key/value limits must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which upstream text shape the input carries.
///
/// The two shapes need different renderers: freeform OCR output has no
/// markup and relies on line heuristics, while the synthesis model emits
/// `**…**` headers and `*` bullets that the report renderer consumes
/// directly. `Auto` exists because batch directories routinely mix both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SourceShape {
    /// Sniff per document: a `**SECTION` tag anywhere selects the tagged
    /// report renderer, otherwise freeform. (default)
    #[default]
    Auto,
    /// Loose free text in `SECTION n:` sections (OCR transcripts).
    FreeformSections,
    /// Markdown-tagged report from the synthesis model.
    TaggedReport,
}

impl SourceShape {
    /// Resolve `Auto` against the actual input text.
    pub fn resolve(&self, text: &str) -> SourceShape {
        match self {
            SourceShape::Auto => {
                if text.contains("**SECTION") {
                    SourceShape::TaggedReport
                } else {
                    SourceShape::FreeformSections
                }
            }
            other => *other,
        }
    }
}

/// How to partition freeform text into sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SplitStrategy {
    /// Split on explicit `SECTION n: TITLE` header lines. (default)
    #[default]
    Headers,
    /// Split on medical section-name keywords from the vocabulary.
    Keywords,
    /// Try headers first; if no header matched (the splitter fell back to a
    /// single `Report` section), re-split by keywords.
    HeadersThenKeywords,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds() {
        let config = ConversionConfig::builder().build().unwrap();
        assert_eq!(config.wrap_threshold, 60);
        assert_eq!(config.split, SplitStrategy::Headers);
        assert_eq!(config.shape, SourceShape::Auto);
    }

    #[test]
    fn empty_title_is_rejected() {
        let err = ConversionConfig::builder().title("  ").build();
        assert!(err.is_err());
    }

    #[test]
    fn concurrency_is_clamped_to_one() {
        let config = ConversionConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn auto_shape_sniffs_tagged_reports() {
        let auto = SourceShape::Auto;
        assert_eq!(
            auto.resolve("**SECTION 1: A**\nbody"),
            SourceShape::TaggedReport
        );
        assert_eq!(
            auto.resolve("SECTION 1: A\nbody"),
            SourceShape::FreeformSections
        );
        assert_eq!(
            SourceShape::TaggedReport.resolve("plain"),
            SourceShape::TaggedReport
        );
    }
}
