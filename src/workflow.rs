//! End-to-end workflow: OCR → synthesis → render → compile.
//!
//! [`run`] drives the four stages over a directory of source material and
//! records a [`StageReport`] per stage. A stage failure stops the run and
//! surfaces that stage's error; intermediate artifacts (extracted
//! transcripts, the synthesized report text) stay in `work_dir` for
//! inspection and re-runs.
//!
//! The OCR stage is skipped entirely when the input directory already
//! contains `.txt` transcripts and no PDFs, so a run can resume from any
//! stage's output.

use crate::config::ConversionConfig;
use crate::convert::{render_tagged_report, write_atomic};
use crate::error::Med2TexError;
use crate::pipeline::compile::compile_pdf;
use crate::pipeline::ocr::OcrClient;
use crate::pipeline::synthesize::SynthesisClient;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Separator between source files in the concatenated synthesis input.
const SOURCE_SEPARATOR: &str =
    "================================================================================";

/// The four workflow stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Ocr,
    Synthesis,
    Render,
    Compile,
}

/// Outcome of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// Record of one stage's execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    pub status: StageStatus,
    /// Files the stage produced (transcripts, `.tex`, `.pdf`).
    pub outputs: Vec<PathBuf>,
    pub duration_ms: u64,
    /// Failure detail when `status` is `Failed`.
    pub error: Option<String>,
}

impl StageReport {
    fn succeeded(stage: Stage, outputs: Vec<PathBuf>, started: Instant) -> Self {
        Self {
            stage,
            status: StageStatus::Succeeded,
            outputs,
            duration_ms: started.elapsed().as_millis() as u64,
            error: None,
        }
    }

    fn skipped(stage: Stage) -> Self {
        Self {
            stage,
            status: StageStatus::Skipped,
            outputs: Vec::new(),
            duration_ms: 0,
            error: None,
        }
    }

    fn failed(stage: Stage, error: &Med2TexError, started: Instant) -> Self {
        Self {
            stage,
            status: StageStatus::Failed,
            outputs: Vec::new(),
            duration_ms: started.elapsed().as_millis() as u64,
            error: Some(error.to_string()),
        }
    }
}

/// Full record of a workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowReport {
    pub stages: Vec<StageReport>,
    /// The rendered report, present once the render stage succeeds.
    pub report_tex: Option<PathBuf>,
    /// The compiled PDF, present once the compile stage succeeds.
    pub report_pdf: Option<PathBuf>,
}

impl WorkflowReport {
    pub fn succeeded(&self) -> bool {
        self.stages
            .iter()
            .all(|s| s.status != StageStatus::Failed)
    }
}

/// Run the full workflow over `input_dir`, keeping artifacts in `work_dir`.
///
/// Source material is every `.pdf` (OCR'd via the service) and `.txt`
/// (used as-is) in `input_dir`. The synthesized report renders to
/// `work_dir/report.tex` and compiles to `work_dir/report.pdf`.
///
/// # Errors
/// The first failing stage's error, with all prior stages' artifacts left
/// in `work_dir`.
pub async fn run(
    input_dir: impl AsRef<Path>,
    work_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<WorkflowReport, Med2TexError> {
    let input_dir = input_dir.as_ref();
    let work_dir = work_dir.as_ref();
    tokio::fs::create_dir_all(work_dir)
        .await
        .map_err(|e| Med2TexError::OutputWriteFailed {
            path: work_dir.to_path_buf(),
            source: e,
        })?;

    let mut report = WorkflowReport {
        stages: Vec::with_capacity(4),
        report_tex: None,
        report_pdf: None,
    };

    // ── Stage 1: OCR ─────────────────────────────────────────────────────
    let started = Instant::now();
    let transcripts = match gather_transcripts(input_dir, work_dir, config).await {
        Ok((transcripts, ocr_ran)) => {
            if ocr_ran {
                report.stages.push(StageReport::succeeded(
                    Stage::Ocr,
                    transcripts.clone(),
                    started,
                ));
            } else {
                report.stages.push(StageReport::skipped(Stage::Ocr));
            }
            transcripts
        }
        Err(e) => {
            report
                .stages
                .push(StageReport::failed(Stage::Ocr, &e, started));
            return Err(e);
        }
    };

    // ── Stage 2: Synthesis ───────────────────────────────────────────────
    let started = Instant::now();
    let report_text = match synthesize_report(&transcripts, work_dir, config).await {
        Ok((text, path)) => {
            report
                .stages
                .push(StageReport::succeeded(Stage::Synthesis, vec![path], started));
            text
        }
        Err(e) => {
            report
                .stages
                .push(StageReport::failed(Stage::Synthesis, &e, started));
            return Err(e);
        }
    };

    // ── Stage 3: Render ──────────────────────────────────────────────────
    let started = Instant::now();
    let tex_path = work_dir.join("report.tex");
    let output = render_tagged_report(&report_text, config);
    match write_atomic(&tex_path, &output.latex).await {
        Ok(()) => {
            report.stages.push(StageReport::succeeded(
                Stage::Render,
                vec![tex_path.clone()],
                started,
            ));
            report.report_tex = Some(tex_path.clone());
        }
        Err(e) => {
            report
                .stages
                .push(StageReport::failed(Stage::Render, &e, started));
            return Err(e);
        }
    }

    // ── Stage 4: Compile ─────────────────────────────────────────────────
    let started = Instant::now();
    match compile_pdf(&tex_path, config).await {
        Ok(pdf_path) => {
            report.stages.push(StageReport::succeeded(
                Stage::Compile,
                vec![pdf_path.clone()],
                started,
            ));
            report.report_pdf = Some(pdf_path);
        }
        Err(e) => {
            report
                .stages
                .push(StageReport::failed(Stage::Compile, &e, started));
            return Err(e);
        }
    }

    info!("Workflow complete: {}", work_dir.display());
    Ok(report)
}

/// Collect transcript files: existing `.txt` as-is, `.pdf` through the OCR
/// service into `work_dir/transcripts/`.
///
/// Returns the transcript paths and whether the OCR service was actually
/// used (false when the input held only `.txt` files).
async fn gather_transcripts(
    input_dir: &Path,
    work_dir: &Path,
    config: &ConversionConfig,
) -> Result<(Vec<PathBuf>, bool), Med2TexError> {
    let meta = tokio::fs::metadata(input_dir)
        .await
        .map_err(|_| Med2TexError::InputNotFound {
            path: input_dir.to_path_buf(),
        })?;
    if !meta.is_dir() {
        return Err(Med2TexError::InvalidInput {
            path: input_dir.to_path_buf(),
        });
    }

    let mut txts: Vec<PathBuf> = Vec::new();
    let mut pdfs: Vec<PathBuf> = Vec::new();
    let mut entries =
        tokio::fs::read_dir(input_dir)
            .await
            .map_err(|e| Med2TexError::ReadFailed {
                path: input_dir.to_path_buf(),
                source: e,
            })?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Med2TexError::ReadFailed {
            path: input_dir.to_path_buf(),
            source: e,
        })?
    {
        let path = entry.path();
        match path.extension().and_then(|e| e.to_str()) {
            Some("txt") => txts.push(path),
            Some("pdf") => pdfs.push(path),
            _ => {}
        }
    }
    txts.sort();
    pdfs.sort();

    if txts.is_empty() && pdfs.is_empty() {
        return Err(Med2TexError::InvalidInput {
            path: input_dir.to_path_buf(),
        });
    }

    let ocr_ran = !pdfs.is_empty();
    let mut transcripts = txts;

    if ocr_ran {
        let client = OcrClient::from_config(config)?;
        client.health_check().await?;

        let transcript_dir = work_dir.join("transcripts");
        tokio::fs::create_dir_all(&transcript_dir).await.map_err(|e| {
            Med2TexError::OutputWriteFailed {
                path: transcript_dir.clone(),
                source: e,
            }
        })?;

        for pdf in &pdfs {
            let text = client.extract(pdf).await?;
            let stem = pdf
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "document".to_string());
            let out = transcript_dir.join(format!("{stem}.txt"));
            write_atomic(&out, &text).await?;
            transcripts.push(out);
        }
    }

    transcripts.sort();
    Ok((transcripts, ocr_ran))
}

/// Concatenate transcripts (with source-file separators), run the synthesis
/// model, and persist its output to `work_dir/synthesized.txt`.
async fn synthesize_report(
    transcripts: &[PathBuf],
    work_dir: &Path,
    config: &ConversionConfig,
) -> Result<(String, PathBuf), Med2TexError> {
    let mut combined = String::new();
    for path in transcripts {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(t) => t,
            Err(e) => {
                warn!("Skipping unreadable transcript {}: {}", path.display(), e);
                continue;
            }
        };
        combined.push_str(&format!(
            "{SOURCE_SEPARATOR}\nSOURCE FILE: {}\n{SOURCE_SEPARATOR}\n\n{}\n\n",
            path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            text.trim()
        ));
    }
    if combined.trim().is_empty() {
        return Err(Med2TexError::Internal(
            "no readable transcripts to synthesize".to_string(),
        ));
    }

    let client = SynthesisClient::from_config(config)?;
    let report_text = client.synthesize(&combined).await?;

    let out = work_dir.join("synthesized.txt");
    write_atomic(&out, &report_text).await?;
    Ok((report_text, out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_input_dir_fails_ocr_stage() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(
            dir.path().join("absent"),
            dir.path().join("work"),
            &ConversionConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Med2TexError::InputNotFound { .. }));
    }

    #[tokio::test]
    async fn empty_input_dir_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        tokio::fs::create_dir_all(&input).await.unwrap();
        let err = run(&input, dir.path().join("work"), &ConversionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Med2TexError::InvalidInput { .. }));
    }

    #[test]
    fn stage_report_serialises() {
        let r = StageReport {
            stage: Stage::Render,
            status: StageStatus::Succeeded,
            outputs: vec![PathBuf::from("report.tex")],
            duration_ms: 12,
            error: None,
        };
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"Render\""));
        assert!(json.contains("report.tex"));
    }
}
