//! Report synthesis: merge transcripts into one tagged report via the
//! Gemini API.
//!
//! This module is intentionally thin — the prompt that controls the report
//! structure lives in [`crate::templates`] so it can be changed without
//! touching retry or error-handling logic here.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 5xx errors from the generative API are transient and frequent
//! under load. Exponential backoff (doubling from `retry_backoff_ms`) avoids
//! thundering-herd: with 500 ms base and 3 retries the wait sequence is
//! 500 ms → 1 s → 2 s.

use crate::config::ConversionConfig;
use crate::error::Med2TexError;
use crate::templates;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

/// Client for the report-synthesis model.
#[derive(Debug)]
pub struct SynthesisClient {
    http: reqwest::Client,
    model: String,
    api_key: String,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl SynthesisClient {
    /// Build a client from the config, reading the API key from
    /// `GEMINI_API_KEY`.
    pub fn from_config(config: &ConversionConfig) -> Result<Self, Med2TexError> {
        let api_key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Med2TexError::SynthesisNotConfigured {
                hint: format!("Set {API_KEY_VAR} in the environment."),
            })?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.synthesis_timeout_secs))
            .build()
            .map_err(|e| Med2TexError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            http,
            model: config.synthesis_model.clone(),
            api_key,
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
        })
    }

    /// Merge the concatenated transcripts into one tagged report.
    ///
    /// Retries transient failures (connection errors, 429, 5xx) with
    /// exponential backoff; client errors (400, 401, 403) fail immediately
    /// since retrying cannot help.
    pub async fn synthesize(&self, transcripts: &str) -> Result<String, Med2TexError> {
        let prompt = templates::synthesis_request(transcripts);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });
        let url = format!(
            "{API_BASE}/{}:generateContent?key={}",
            self.model, self.api_key
        );
        info!(
            "Synthesizing report with {} ({} chars of source)",
            self.model,
            transcripts.chars().count()
        );

        let mut last_err: Option<String> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!(
                    "Synthesis retry {}/{} after {}ms",
                    attempt, self.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match self.http.post(&url).json(&body).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let payload: GenerateResponse =
                            response.json().await.map_err(|e| {
                                Med2TexError::SynthesisFailed {
                                    retries: attempt,
                                    detail: format!("malformed response: {e}"),
                                }
                            })?;
                        let report = extract_text(&payload).ok_or_else(|| {
                            Med2TexError::SynthesisFailed {
                                retries: attempt,
                                detail: "response carried no candidates".to_string(),
                            }
                        })?;
                        debug!("Synthesis produced {} chars", report.chars().count());
                        return Ok(report);
                    }
                    if status.is_client_error() && status.as_u16() != 429 {
                        // Bad request or bad key; retrying cannot help.
                        return Err(Med2TexError::SynthesisFailed {
                            retries: attempt,
                            detail: format!("HTTP {status}"),
                        });
                    }
                    last_err = Some(format!("HTTP {status}"));
                }
                Err(e) => {
                    warn!("Synthesis attempt {} failed: {}", attempt + 1, e);
                    last_err = Some(e.to_string());
                }
            }
        }

        Err(Med2TexError::SynthesisFailed {
            retries: self.max_retries,
            detail: last_err.unwrap_or_else(|| "unknown error".to_string()),
        })
    }
}

/// First candidate's concatenated text parts, if any.
fn extract_text(payload: &GenerateResponse) -> Option<String> {
    let candidate = payload.candidates.first()?;
    let text: String = candidate
        .content
        .parts
        .iter()
        .map(|p| p.text.as_str())
        .collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json_text: &str) -> GenerateResponse {
        serde_json::from_str(json_text).unwrap()
    }

    #[test]
    fn extracts_first_candidate_text() {
        let p = payload(
            r#"{"candidates":[{"content":{"parts":[{"text":"**SECTION 1: A**\n"},{"text":"Name: Jane"}]}}]}"#,
        );
        assert_eq!(
            extract_text(&p).unwrap(),
            "**SECTION 1: A**\nName: Jane"
        );
    }

    #[test]
    fn empty_candidates_yield_none() {
        let p = payload(r#"{"candidates":[]}"#);
        assert!(extract_text(&p).is_none());
        let blank = payload(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#);
        assert!(extract_text(&blank).is_none());
    }

    #[test]
    fn missing_key_is_a_config_error() {
        // Temporarily clear the variable for this test.
        let saved = std::env::var(API_KEY_VAR).ok();
        std::env::remove_var(API_KEY_VAR);
        let err = SynthesisClient::from_config(&ConversionConfig::default()).unwrap_err();
        assert!(matches!(err, Med2TexError::SynthesisNotConfigured { .. }));
        if let Some(v) = saved {
            std::env::set_var(API_KEY_VAR, v);
        }
    }
}
