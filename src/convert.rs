//! Eager conversion entry points.
//!
//! ## Why eager vs. streaming?
//!
//! This module provides the simpler API: convert everything, then return.
//! [`convert_dir`] collects every [`DocumentResult`] into memory before
//! returning. Use [`crate::stream::convert_dir_stream`] instead when you
//! want per-document results progressively, e.g. to drive a UI over a
//! directory with hundreds of transcripts.
//!
//! The text-to-LaTeX core ([`convert_text`]) is pure and synchronous; only
//! the file and batch entry points are async.

use crate::config::{ConversionConfig, SourceShape, SplitStrategy};
use crate::error::{DocumentError, Med2TexError};
use crate::output::{BatchOutput, BatchStats, ConversionOutput, DocumentResult, DocumentStats};
use crate::pipeline::render::{render_freeform_section, render_tagged_report_body, RenderCounts};
use crate::pipeline::split::{split_by_headers, split_by_keywords, Section};
use crate::pipeline::{preprocess, split};
use crate::templates;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert transcript text to a complete LaTeX document.
///
/// This is the primary entry point for the library. The input shape is
/// resolved per [`SourceShape`]; `Auto` sniffs for synthesis-model tags.
/// Conversion is total: any text yields a compilable document, and empty or
/// whitespace-only input yields a document with preamble and closing but no
/// sections.
///
/// # Example
/// ```rust
/// use med2tex::{convert_text, ConversionConfig};
///
/// let config = ConversionConfig::default();
/// let output = convert_text("SECTION 1: NOTES\nName: Jane Doe", &config);
/// assert!(output.latex.contains("\\section{NOTES}"));
/// assert!(output.latex.ends_with("\\end{document}\n"));
/// ```
pub fn convert_text(text: &str, config: &ConversionConfig) -> ConversionOutput {
    let start = Instant::now();
    let cleaned = preprocess::clean_transcript(text);

    let mut output = match config.shape.resolve(&cleaned) {
        SourceShape::TaggedReport => render_tagged_report(&cleaned, config),
        _ => render_freeform_sections(&cleaned, config),
    };

    output.stats.input_chars = cleaned.chars().count();
    output.stats.latex_chars = output.latex.chars().count();
    output.stats.duration_ms = start.elapsed().as_millis() as u64;
    debug!(
        sections = output.stats.sections,
        table_rows = output.stats.table_rows,
        latex_chars = output.stats.latex_chars,
        "conversion complete"
    );
    output
}

/// Render cleaned freeform text as a sectioned LaTeX document.
///
/// Splitting follows `config.split`; `HeadersThenKeywords` re-splits by
/// keywords when no explicit header matched (the header splitter fell back
/// to a single whole-document `Report` section).
pub fn render_freeform_sections(text: &str, config: &ConversionConfig) -> ConversionOutput {
    let mut latex = templates::freeform_preamble(&config.title, &config.author);
    let mut counts = RenderCounts::default();

    let sections = if text.is_empty() {
        Vec::new()
    } else {
        split_freeform(text, config)
    };

    for section in &sections {
        let (block, block_counts) = render_freeform_section(section, config);
        latex.push_str(&block);
        counts.absorb(block_counts);
    }

    latex.push_str(templates::CLOSING);

    ConversionOutput {
        latex,
        stats: DocumentStats {
            sections: sections.len(),
            table_rows: counts.table_rows,
            paragraphs: counts.paragraphs,
            checkbox_items: counts.checkbox_items,
            list_items: counts.list_items,
            ..DocumentStats::default()
        },
    }
}

/// Render cleaned synthesis-model output as a tagged-report LaTeX document.
///
/// Unlike the freeform variant the body is a single sequential scan — the
/// model already ordered the content, so no section splitting happens here.
pub fn render_tagged_report(text: &str, config: &ConversionConfig) -> ConversionOutput {
    let mut latex = templates::report_preamble(&config.title, &config.author);

    let (body, counts) = if text.is_empty() {
        (String::new(), RenderCounts::default())
    } else {
        render_tagged_report_body(text, config)
    };
    let sections = body.matches("\\section{").count();
    latex.push_str(&body);

    let generated_at = match &config.generated_at {
        Some(ts) => ts.clone(),
        None => chrono::Utc::now().format("%Y-%m-%d %H:%M UTC").to_string(),
    };
    latex.push_str(&templates::report_footer(&generated_at));
    latex.push_str(templates::CLOSING);

    ConversionOutput {
        latex,
        stats: DocumentStats {
            sections,
            table_rows: counts.table_rows,
            paragraphs: counts.paragraphs,
            checkbox_items: counts.checkbox_items,
            list_items: counts.list_items,
            ..DocumentStats::default()
        },
    }
}

fn split_freeform(text: &str, config: &ConversionConfig) -> Vec<Section> {
    match config.split {
        SplitStrategy::Headers => split_by_headers(text),
        SplitStrategy::Keywords => split_by_keywords(text, &config.vocabulary),
        SplitStrategy::HeadersThenKeywords => {
            let sections = split_by_headers(text);
            let fell_back = sections.len() == 1 && sections[0].title == "Report";
            if fell_back {
                split_by_keywords(text, &config.vocabulary)
            } else {
                sections
            }
        }
    }
}

/// Convert one transcript file and write the LaTeX next to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<DocumentStats, Med2TexError> {
    let input_path = input_path.as_ref();
    let text = read_transcript(input_path).await?;
    let output = convert_text(&text, config);
    write_atomic(output_path.as_ref(), &output.latex).await?;
    Ok(output.stats)
}

/// Convert every `.txt` transcript in a directory.
///
/// Documents are converted concurrently (`config.concurrency` at a time) and
/// each writes `<stem>.tex` into `output_dir`. A failing document records a
/// [`DocumentError`] in its [`DocumentResult`] without stopping the batch.
///
/// # Errors
/// Fatal only when the input directory is unusable or when every document
/// failed ([`Med2TexError::AllDocumentsFailed`]).
pub async fn convert_dir(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<BatchOutput, Med2TexError> {
    let start = Instant::now();
    let input_dir = input_dir.as_ref();
    let output_dir = output_dir.as_ref().to_path_buf();

    let inputs = discover_transcripts(input_dir).await?;
    let total = inputs.len();
    info!("Converting {} transcripts from {}", total, input_dir.display());

    if let Some(ref cb) = config.progress {
        cb.on_batch_start(total);
    }

    tokio::fs::create_dir_all(&output_dir)
        .await
        .map_err(|e| Med2TexError::OutputWriteFailed {
            path: output_dir.clone(),
            source: e,
        })?;

    let mut documents: Vec<DocumentResult> =
        stream::iter(inputs.into_iter().enumerate().map(|(i, input)| {
            let output_dir = output_dir.clone();
            let config = config.clone();
            async move {
                let index = i + 1;
                if let Some(ref cb) = config.progress {
                    cb.on_document_start(index, total, &input);
                }
                let result = convert_one(&input, &output_dir, &config).await;
                if let Some(ref cb) = config.progress {
                    match &result.error {
                        None => {
                            let latex_len =
                                result.stats.as_ref().map_or(0, |s| s.latex_chars);
                            cb.on_document_complete(index, total, latex_len);
                        }
                        Some(e) => cb.on_document_error(index, total, &e.to_string()),
                    }
                }
                (i, result)
            }
        }))
        .buffer_unordered(config.concurrency)
        .collect::<Vec<(usize, DocumentResult)>>()
        .await
        .into_iter()
        .map(|(_, r)| r)
        .collect();

    // buffer_unordered scrambles completion order; restore discovery order.
    documents.sort_by(|a, b| a.input.cmp(&b.input));

    let succeeded = documents.iter().filter(|d| d.succeeded()).count();
    let failed = total - succeeded;

    if total > 0 && succeeded == 0 {
        let first_error = documents
            .iter()
            .find_map(|d| d.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(Med2TexError::AllDocumentsFailed { total, first_error });
    }

    if let Some(ref cb) = config.progress {
        cb.on_batch_complete(total, succeeded);
    }
    info!("Batch complete: {}/{} documents", succeeded, total);

    Ok(BatchOutput {
        documents,
        stats: BatchStats {
            total,
            succeeded,
            failed,
            duration_ms: start.elapsed().as_millis() as u64,
        },
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn convert_one(input: &Path, output_dir: &Path, config: &ConversionConfig) -> DocumentResult {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    let output_path = output_dir.join(format!("{stem}.tex"));

    let text = match tokio::fs::read_to_string(input).await {
        Ok(t) => t,
        Err(e) => {
            warn!("Failed to read {}: {}", input.display(), e);
            return DocumentResult {
                input: input.to_path_buf(),
                output: None,
                stats: None,
                error: Some(DocumentError::ReadFailed {
                    path: input.to_path_buf(),
                    detail: e.to_string(),
                }),
            };
        }
    };

    let output = convert_text(&text, config);

    match write_atomic(&output_path, &output.latex).await {
        Ok(()) => DocumentResult {
            input: input.to_path_buf(),
            output: Some(output_path),
            stats: Some(output.stats),
            error: None,
        },
        Err(e) => DocumentResult {
            input: input.to_path_buf(),
            output: None,
            stats: None,
            error: Some(DocumentError::WriteFailed {
                path: output_path,
                detail: e.to_string(),
            }),
        },
    }
}

/// List `.txt` files in `dir`, sorted by path for stable batch order.
pub(crate) async fn discover_transcripts(dir: &Path) -> Result<Vec<PathBuf>, Med2TexError> {
    let meta = tokio::fs::metadata(dir)
        .await
        .map_err(|_| Med2TexError::InputNotFound {
            path: dir.to_path_buf(),
        })?;
    if !meta.is_dir() {
        return Err(Med2TexError::InvalidInput {
            path: dir.to_path_buf(),
        });
    }

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => Med2TexError::PermissionDenied {
                path: dir.to_path_buf(),
            },
            _ => Med2TexError::ReadFailed {
                path: dir.to_path_buf(),
                source: e,
            },
        })?;

    let mut inputs = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| Med2TexError::ReadFailed {
        path: dir.to_path_buf(),
        source: e,
    })? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "txt") {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

async fn read_transcript(path: &Path) -> Result<String, Med2TexError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Med2TexError::InputNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => Med2TexError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => Med2TexError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            },
        })
}

/// Atomic write: write to temp, then rename.
pub(crate) async fn write_atomic(path: &Path, contents: &str) -> Result<(), Med2TexError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Med2TexError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("tex.tmp");
    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(|e| Med2TexError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Med2TexError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConversionConfig, SourceShape, SplitStrategy};

    fn config() -> ConversionConfig {
        ConversionConfig::default()
    }

    #[test]
    fn freeform_document_is_complete() {
        let out = convert_text("SECTION 1: NOTES\nName: Jane", &config());
        assert!(out.latex.starts_with("\\documentclass"));
        assert!(out.latex.contains("\\section{NOTES}"));
        assert!(out.latex.ends_with("\\end{document}\n"));
        assert_eq!(out.stats.sections, 1);
        assert_eq!(out.stats.table_rows, 1);
    }

    #[test]
    fn empty_input_yields_header_and_footer_only() {
        let out = convert_text("   \n\n  ", &config());
        assert!(out.latex.contains("\\begin{document}"));
        assert!(out.latex.ends_with("\\end{document}\n"));
        assert!(!out.latex.contains("\\section"));
        assert_eq!(out.stats.sections, 0);
    }

    #[test]
    fn auto_shape_selects_report_renderer() {
        let out = convert_text("**SECTION 1: A**\nName: Jane", &config());
        assert!(out.latex.contains("\\usepackage{seqsplit}"), "{}", out.latex);
        assert!(out.latex.contains("\\section{SECTION 1: A}"), "{}", out.latex);
    }

    #[test]
    fn tagged_report_has_timestamp_footer() {
        let cfg = ConversionConfig::builder()
            .shape(SourceShape::TaggedReport)
            .generated_at("2026-08-27 10:00 UTC")
            .build()
            .unwrap();
        let out = convert_text("**SECTION 1: A**\nbody", &cfg);
        assert!(out.latex.contains("Generated on 2026-08-27 10:00 UTC."));
    }

    #[test]
    fn headers_then_keywords_falls_back() {
        let cfg = ConversionConfig::builder()
            .split_strategy(SplitStrategy::HeadersThenKeywords)
            .build()
            .unwrap();
        let out = convert_text("Chief Complaint\nChest pain.", &cfg);
        assert!(out.latex.contains("\\section{Chief Complaint}"), "{}", out.latex);
    }

    #[test]
    fn headers_then_keywords_prefers_headers() {
        let cfg = ConversionConfig::builder()
            .split_strategy(SplitStrategy::HeadersThenKeywords)
            .build()
            .unwrap();
        let out = convert_text("SECTION 1: INTAKE\nChief Complaint: cough", &cfg);
        assert!(out.latex.contains("\\section{INTAKE}"), "{}", out.latex);
    }

    #[tokio::test]
    async fn convert_file_writes_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        let output = dir.path().join("out/notes.tex");
        tokio::fs::write(&input, "SECTION 1: A\nName: Jane")
            .await
            .unwrap();

        let stats = convert_file(&input, &output, &config()).await.unwrap();
        assert_eq!(stats.sections, 1);

        let written = tokio::fs::read_to_string(&output).await.unwrap();
        assert!(written.contains("\\section{A}"));
        // No leftover temp file.
        assert!(!output.with_extension("tex.tmp").exists());
    }

    #[tokio::test]
    async fn convert_file_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = convert_file(
            dir.path().join("absent.txt"),
            dir.path().join("out.tex"),
            &config(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Med2TexError::InputNotFound { .. }));
    }

    #[tokio::test]
    async fn convert_dir_batches_all_txt_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("tex");
        tokio::fs::write(dir.path().join("a.txt"), "SECTION 1: A\nx: y")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("b.txt"), "SECTION 1: B\nplain prose")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("ignored.pdf"), "%PDF")
            .await
            .unwrap();

        let batch = convert_dir(dir.path(), &out, &config()).await.unwrap();
        assert_eq!(batch.stats.total, 2);
        assert_eq!(batch.stats.succeeded, 2);
        assert!(out.join("a.tex").exists());
        assert!(out.join("b.tex").exists());
        // Discovery order preserved despite concurrent completion.
        assert!(batch.documents[0].input.ends_with("a.txt"));
    }

    #[tokio::test]
    async fn convert_dir_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = convert_dir(dir.path().join("absent"), dir.path().join("out"), &config())
            .await
            .unwrap_err();
        assert!(matches!(err, Med2TexError::InputNotFound { .. }));
    }
}
