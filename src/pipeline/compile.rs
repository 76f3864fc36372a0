//! LaTeX compilation: run `pdflatex` on a rendered `.tex` file.
//!
//! pdflatex exits non-zero for recoverable warnings (overfull boxes, missing
//! references) while still writing a usable PDF, so success is judged by
//! whether the PDF exists afterwards, not by the exit code. Two passes run
//! so the table of contents in the report variant resolves.

use crate::config::ConversionConfig;
use crate::error::Med2TexError;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Auxiliary extensions pdflatex leaves behind; removed after a successful
/// compile so the output directory holds only `.tex` and `.pdf`.
const AUX_EXTENSIONS: &[&str] = &["aux", "log", "out", "toc"];

/// Compile `tex_path` to a PDF in the same directory.
///
/// Returns the path of the produced PDF.
pub async fn compile_pdf(
    tex_path: &Path,
    config: &ConversionConfig,
) -> Result<PathBuf, Med2TexError> {
    let out_dir = tex_path.parent().unwrap_or_else(|| Path::new("."));
    let pdf_path = tex_path.with_extension("pdf");
    info!("Compiling {}", tex_path.display());

    // Second pass resolves \tableofcontents references.
    for pass in 1..=2 {
        let status = Command::new(&config.pdflatex_path)
            .arg("-interaction=nonstopmode")
            .arg("-output-directory")
            .arg(out_dir)
            .arg(tex_path)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await
            .map_err(|e| Med2TexError::CompilerNotFound {
                path: config.pdflatex_path.clone(),
                reason: e.to_string(),
            })?;
        debug!("pdflatex pass {} exited with {}", pass, status);
    }

    if !pdf_path.exists() {
        return Err(Med2TexError::CompileFailed {
            tex_path: tex_path.to_path_buf(),
            log_tail: read_log_tail(&tex_path.with_extension("log")).await,
        });
    }

    cleanup_aux_files(tex_path).await;
    Ok(pdf_path)
}

/// Last lines of the pdflatex log, for the error message.
async fn read_log_tail(log_path: &Path) -> String {
    match tokio::fs::read_to_string(log_path).await {
        Ok(log) => {
            let lines: Vec<&str> = log.lines().collect();
            let tail_start = lines.len().saturating_sub(20);
            lines[tail_start..].join("\n")
        }
        Err(_) => "(no log file)".to_string(),
    }
}

async fn cleanup_aux_files(tex_path: &Path) {
    for ext in AUX_EXTENSIONS {
        let aux = tex_path.with_extension(ext);
        if let Err(e) = tokio::fs::remove_file(&aux).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Could not remove {}: {}", aux.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_compiler_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let tex = dir.path().join("doc.tex");
        tokio::fs::write(&tex, "\\documentclass{article}\\begin{document}x\\end{document}")
            .await
            .unwrap();

        let config = ConversionConfig::builder()
            .pdflatex_path("/nonexistent/pdflatex")
            .build()
            .unwrap();
        let err = compile_pdf(&tex, &config).await.unwrap_err();
        assert!(matches!(err, Med2TexError::CompilerNotFound { .. }));
    }

    #[tokio::test]
    async fn log_tail_reads_last_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("doc.log");
        let contents: String = (1..=30).map(|i| format!("line {i}\n")).collect();
        tokio::fs::write(&log, contents).await.unwrap();

        let tail = read_log_tail(&log).await;
        assert!(tail.contains("line 30"));
        assert!(!tail.contains("line 5\n"));
    }
}
