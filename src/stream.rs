//! Streaming batch API: emit documents as they complete.
//!
//! ## Why stream?
//!
//! A directory of transcripts can hold hundreds of files. A streams-based
//! API lets callers display per-document results immediately, wire up
//! progress bars, or persist results incrementally instead of waiting for
//! the whole batch.
//!
//! Unlike the eager [`crate::convert::convert_dir`] which returns only
//! after every document finishes, [`convert_dir_stream`] yields
//! [`DocumentResult`] items via a `Stream` as each document completes.
//! Documents may arrive out of completion order (sort by `input` if order
//! matters).

use crate::config::ConversionConfig;
use crate::convert::{convert_text, discover_transcripts, write_atomic};
use crate::error::{DocumentError, Med2TexError};
use crate::output::DocumentResult;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-document results.
pub type DocumentStream = Pin<Box<dyn Stream<Item = DocumentResult> + Send>>;

/// Convert every `.txt` transcript in a directory, streaming results as
/// they are ready.
///
/// Each document writes `<stem>.tex` into `output_dir`, exactly like
/// [`crate::convert::convert_dir`]; a failing document yields a
/// [`DocumentResult`] carrying a [`DocumentError`] rather than ending the
/// stream.
///
/// # Returns
/// - `Ok(DocumentStream)` — a stream of [`DocumentResult`]
/// - `Err(Med2TexError)` — fatal error (directory missing, unwritable
///   output directory)
///
/// # Example
/// ```rust,no_run
/// use med2tex::{convert_dir_stream, ConversionConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConversionConfig::default();
/// let mut stream = convert_dir_stream("transcripts/", "tex/", &config).await?;
/// while let Some(doc) = stream.next().await {
///     match doc.error {
///         None => println!("{} done", doc.input.display()),
///         Some(e) => eprintln!("{} failed: {e}", doc.input.display()),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn convert_dir_stream(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<DocumentStream, Med2TexError> {
    let input_dir = input_dir.as_ref();
    let output_dir = output_dir.as_ref().to_path_buf();

    let inputs = discover_transcripts(input_dir).await?;
    info!(
        "Streaming {} transcripts from {}",
        inputs.len(),
        input_dir.display()
    );

    tokio::fs::create_dir_all(&output_dir)
        .await
        .map_err(|e| Med2TexError::OutputWriteFailed {
            path: output_dir.clone(),
            source: e,
        })?;

    let concurrency = config.concurrency;
    let config = config.clone();

    let s = stream::iter(inputs.into_iter().map(move |input| {
        let output_dir = output_dir.clone();
        let config = config.clone();
        async move { convert_one_streamed(&input, &output_dir, &config).await }
    }))
    .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}

async fn convert_one_streamed(
    input: &PathBuf,
    output_dir: &Path,
    config: &ConversionConfig,
) -> DocumentResult {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    let output_path = output_dir.join(format!("{stem}.tex"));

    let text = match tokio::fs::read_to_string(input).await {
        Ok(t) => t,
        Err(e) => {
            return DocumentResult {
                input: input.clone(),
                output: None,
                stats: None,
                error: Some(DocumentError::ReadFailed {
                    path: input.clone(),
                    detail: e.to_string(),
                }),
            }
        }
    };

    let output = convert_text(&text, config);

    match write_atomic(&output_path, &output.latex).await {
        Ok(()) => DocumentResult {
            input: input.clone(),
            output: Some(output_path),
            stats: Some(output.stats),
            error: None,
        },
        Err(e) => DocumentResult {
            input: input.clone(),
            output: None,
            stats: None,
            error: Some(DocumentError::WriteFailed {
                path: output_path,
                detail: e.to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn stream_yields_one_result_per_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("tex");
        tokio::fs::write(dir.path().join("a.txt"), "SECTION 1: A\nx: y")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("b.txt"), "prose only")
            .await
            .unwrap();

        let config = ConversionConfig::default();
        let results: Vec<DocumentResult> = convert_dir_stream(dir.path(), &out, &config)
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.succeeded()));
        assert!(out.join("a.tex").exists());
        assert!(out.join("b.tex").exists());
    }

    #[tokio::test]
    async fn stream_missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = convert_dir_stream(
            dir.path().join("absent"),
            dir.path().join("out"),
            &ConversionConfig::default(),
        )
        .await;
        assert!(err.is_err());
    }
}
