//! OCR service client: extract transcript text from scanned PDFs.
//!
//! The OCR service runs as a separate HTTP process (it owns the heavyweight
//! vision models). This client is intentionally thin: one health check, one
//! extraction call, and the transcript formatting that stitches the
//! service's two payload halves back into a single text the rest of the
//! pipeline understands.

use crate::config::ConversionConfig;
use crate::error::Med2TexError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Heading the formatter places above the prose half of the transcript.
const EXTRACTED_HEADER: &str = "=== EXTRACTED TEXT ===";
/// Heading above the timeline half. Matches
/// [`crate::pipeline::split::TIMELINE_MARKER`] so the splitter can discard
/// the machine-generated part later.
const TIMELINE_HEADER: &str = "=== TIMELINE DATA ===";

#[derive(Serialize)]
struct ExtractRequest {
    pdf_base64: String,
}

#[derive(Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    extracted_text: String,
    #[serde(default)]
    timeline_data: Vec<TimelineEntry>,
}

#[derive(Deserialize)]
struct TimelineEntry {
    #[serde(default)]
    content: String,
}

/// Client for the transcript-extraction HTTP service.
pub struct OcrClient {
    http: reqwest::Client,
    base_url: String,
}

impl OcrClient {
    /// Build a client from the configured service URL and timeout.
    pub fn from_config(config: &ConversionConfig) -> Result<Self, Med2TexError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.ocr_timeout_secs))
            .build()
            .map_err(|e| Med2TexError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.ocr_url.trim_end_matches('/').to_string(),
        })
    }

    /// Verify the service answers `GET /health`.
    pub async fn health_check(&self) -> Result<(), Med2TexError> {
        let url = format!("{}/health", self.base_url);
        let response =
            self.http
                .get(&url)
                .send()
                .await
                .map_err(|e| Med2TexError::OcrUnavailable {
                    url: self.base_url.clone(),
                    reason: e.to_string(),
                })?;
        if !response.status().is_success() {
            return Err(Med2TexError::OcrUnavailable {
                url: self.base_url.clone(),
                reason: format!("health check returned HTTP {}", response.status()),
            });
        }
        debug!("OCR service healthy at {}", self.base_url);
        Ok(())
    }

    /// Extract the transcript for one scanned PDF.
    ///
    /// The PDF is read into memory and shipped base64-encoded; the service
    /// answers with prose text plus a list of timeline entries, which
    /// [`format_transcript`] folds into a single transcript string.
    pub async fn extract(&self, pdf_path: &Path) -> Result<String, Med2TexError> {
        let bytes = tokio::fs::read(pdf_path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Med2TexError::InputNotFound {
                    path: pdf_path.to_path_buf(),
                },
                _ => Med2TexError::ReadFailed {
                    path: pdf_path.to_path_buf(),
                    source: e,
                },
            })?;
        info!(
            "Extracting text from {} ({} KiB)",
            pdf_path.display(),
            bytes.len() / 1024
        );

        let request = ExtractRequest {
            pdf_base64: BASE64.encode(&bytes),
        };
        let url = format!("{}/timeline/from-text", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Med2TexError::OcrFailed {
                path: pdf_path.to_path_buf(),
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(Med2TexError::OcrFailed {
                path: pdf_path.to_path_buf(),
                detail: format!("service returned HTTP {}", response.status()),
            });
        }

        let payload: ExtractResponse =
            response.json().await.map_err(|e| Med2TexError::OcrFailed {
                path: pdf_path.to_path_buf(),
                detail: format!("malformed response: {e}"),
            })?;

        Ok(format_transcript(&payload))
    }
}

/// Fold the service response into one transcript string.
///
/// The prose half goes under `=== EXTRACTED TEXT ===`; timeline entries
/// follow under `=== TIMELINE DATA ===`, numbered in order. An empty
/// timeline omits its half entirely so downstream truncation has nothing
/// to do.
fn format_transcript(payload: &ExtractResponse) -> String {
    let mut out = format!("{EXTRACTED_HEADER}\n{}", payload.extracted_text.trim());

    let entries: Vec<&TimelineEntry> = payload
        .timeline_data
        .iter()
        .filter(|e| !e.content.trim().is_empty())
        .collect();
    if !entries.is_empty() {
        out.push_str(&format!("\n\n{TIMELINE_HEADER}\n"));
        for (i, entry) in entries.iter().enumerate() {
            out.push_str(&format!("[{}] {}\n", i + 1, entry.content.trim()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_carries_both_halves() {
        let payload = ExtractResponse {
            extracted_text: "SECTION 1: NOTES\nName: Jane".into(),
            timeline_data: vec![
                TimelineEntry {
                    content: "2024-01-02 admitted".into(),
                },
                TimelineEntry {
                    content: "2024-01-05 discharged".into(),
                },
            ],
        };
        let text = format_transcript(&payload);
        assert!(text.starts_with("=== EXTRACTED TEXT ===\nSECTION 1: NOTES"));
        assert!(text.contains("=== TIMELINE DATA ===\n[1] 2024-01-02 admitted"));
        assert!(text.contains("[2] 2024-01-05 discharged"));
    }

    #[test]
    fn empty_timeline_omits_marker() {
        let payload = ExtractResponse {
            extracted_text: "prose".into(),
            timeline_data: vec![TimelineEntry { content: "  ".into() }],
        };
        let text = format_transcript(&payload);
        assert!(!text.contains("TIMELINE"));
    }

    #[tokio::test]
    async fn health_check_fails_when_unreachable() {
        let config = ConversionConfig::builder()
            .ocr_url("http://127.0.0.1:1") // nothing listens on port 1
            .ocr_timeout_secs(1)
            .build()
            .unwrap();
        let client = OcrClient::from_config(&config).unwrap();
        let err = client.health_check().await.unwrap_err();
        assert!(matches!(err, Med2TexError::OcrUnavailable { .. }));
    }
}
