//! Text-generation capability.
//!
//! The core only depends on the `TextGenerator` trait: prompt in, text out.
//! The shipped implementation calls the Gemini `generateContent` endpoint
//! over reqwest with a bounded fixed-delay retry for transient faults
//! (429/5xx and transport timeouts). Non-retryable statuses surface
//! immediately.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Provider error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("No API key configured (set GEMINI_API_KEY)")]
    MissingApiKey,
    #[error("Provider returned no text candidates")]
    EmptyResponse,
}

/// Prompt-in, text-out capability. Object-safe so services can hold
/// `&dyn TextGenerator` and tests can substitute a stub.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Bounded retry with a fixed delay between attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(500),
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

// ============================================================================
// Client
// ============================================================================

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    retry: RetryPolicy,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Build from `GEMINI_API_KEY` / `GEMINI_MODEL` environment variables.
    pub fn from_env() -> Result<Self, GenerationError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(GenerationError::MissingApiKey)?;
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self::new(api_key, model))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", GEMINI_BASE_URL, self.model)
    }

    fn is_retryable_status(status: reqwest::StatusCode) -> bool {
        status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    async fn send_with_retry(&self, prompt: &str) -> Result<reqwest::Response, GenerationError> {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };
        let attempts = self.retry.max_attempts.max(1);

        for attempt in 1..=attempts {
            let result = self
                .client
                .post(self.endpoint())
                .query(&[("key", self.api_key.as_str())])
                .json(&body)
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if Self::is_retryable_status(status) && attempt < attempts {
                        log::warn!(
                            "genai retry {}/{} after status {}",
                            attempt,
                            attempts,
                            status
                        );
                        tokio::time::sleep(self.retry.delay).await;
                        continue;
                    }
                    return Ok(response);
                }
                Err(err) => {
                    let retryable = err.is_timeout() || err.is_connect();
                    if retryable && attempt < attempts {
                        log::warn!(
                            "genai retry {}/{} after transport error: {}",
                            attempt,
                            attempts,
                            err
                        );
                        tokio::time::sleep(self.retry.delay).await;
                        continue;
                    }
                    return Err(GenerationError::Http(err));
                }
            }
        }

        unreachable!("retry loop always returns within max_attempts")
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let response = self.send_with_retry(prompt).await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text)
    }
}
