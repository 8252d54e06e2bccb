//! LLM client — the single point of entry for all Gemini API calls.
//!
//! No other module may talk to the model API directly: question generation
//! and transcript scoring both go through [`GeminiClient::call`]. The HTTP
//! layer sits behind the [`ModelTransport`] trait so retry semantics are
//! testable without a network.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1/models";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Bounded retry with linear, attempt-indexed backoff: the delay before
/// attempt k+1 is `base_delay_ms * k`. Attempts are sequential.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("GEMINI_API_KEY is not configured")]
    MissingApiKey,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("retries exhausted after {attempts} attempts (last: {last})")]
    RetryExhausted { attempts: u32, last: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model returned empty content")]
    EmptyContent,
}

// ────────────────────────────────────────────────────────────────────────────
// Transport seam
// ────────────────────────────────────────────────────────────────────────────

/// A completed HTTP exchange. Carried whole so the retry loop can decide on
/// the status code and the caller can interpret the body.
#[derive(Debug, Clone)]
pub struct TransportReply {
    pub status: u16,
    pub body: String,
}

impl TransportReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network-level failure: connection refused, DNS failure, timeout.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportFault(pub String);

#[async_trait]
pub trait ModelTransport: Send + Sync {
    async fn dispatch(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<TransportReply, TransportFault>;
}

/// Production transport backed by reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelTransport for HttpTransport {
    async fn dispatch(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<TransportReply, TransportFault> {
        let response = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| TransportFault(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportFault(e.to_string()))?;

        Ok(TransportReply { status, body })
    }
}

/// Issues a request with bounded retry. Retries only on server-side transient
/// statuses (500, 503) or a network-level fault; every other status returns
/// immediately and the caller interprets success/failure.
pub async fn send_with_retry(
    transport: &dyn ModelTransport,
    url: &str,
    body: &serde_json::Value,
    policy: RetryPolicy,
) -> Result<TransportReply, LlmError> {
    let mut last: String = String::new();

    for attempt in 1..=policy.max_attempts {
        match transport.dispatch(url, body).await {
            Ok(reply) if !matches!(reply.status, 500 | 503) => return Ok(reply),
            Ok(reply) => {
                warn!(
                    "model call attempt {attempt}/{} failed with status {}",
                    policy.max_attempts, reply.status
                );
                last = format!("status {}", reply.status);
            }
            Err(fault) => {
                warn!(
                    "model call attempt {attempt}/{} failed: {fault}",
                    policy.max_attempts
                );
                last = fault.to_string();
            }
        }

        if attempt < policy.max_attempts {
            let delay = Duration::from_millis(policy.base_delay_ms * attempt as u64);
            tokio::time::sleep(delay).await;
        }
    }

    Err(LlmError::RetryExhausted {
        attempts: policy.max_attempts,
        last,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini wire format
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

impl GeminiRequest {
    fn user_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

impl GeminiResponse {
    /// Text of the first candidate's first part, if any.
    fn text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .map(|p| p.text.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The single model client shared by all components.
#[derive(Clone)]
pub struct GeminiClient {
    transport: Arc<dyn ModelTransport>,
    api_key: Option<String>,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self {
            transport: Arc::new(HttpTransport::new()),
            api_key,
            model,
        }
    }

    /// Builds a client over a custom transport. Used by tests to exercise the
    /// retry and fallback paths without a network.
    pub fn with_transport(
        transport: Arc<dyn ModelTransport>,
        api_key: Option<String>,
        model: String,
    ) -> Self {
        Self {
            transport,
            api_key,
            model,
        }
    }

    /// Sends a single-turn prompt and returns the raw text payload.
    ///
    /// A missing API key fails before any network activity; callers treat it
    /// exactly like a transport failure (fallback path, never a crash).
    pub async fn call(&self, prompt: &str, policy: RetryPolicy) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;
        let url = format!(
            "{GEMINI_API_BASE}/{}:generateContent?key={api_key}",
            self.model
        );
        let body = serde_json::to_value(GeminiRequest::user_prompt(prompt))?;

        let reply = send_with_retry(self.transport.as_ref(), &url, &body, policy).await?;

        if !reply.is_success() {
            // Prefer the structured API message when the body carries one
            let message = serde_json::from_str::<GeminiError>(&reply.body)
                .map(|e| e.error.message)
                .unwrap_or(reply.body);
            return Err(LlmError::Api {
                status: reply.status,
                message,
            });
        }

        let parsed: GeminiResponse = serde_json::from_str(&reply.body)?;
        let text = parsed.text().ok_or(LlmError::EmptyContent)?;

        debug!("model call succeeded ({} chars)", text.len());
        Ok(text.to_string())
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
