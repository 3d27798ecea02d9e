//! LLM Client: the single point of entry for Claude API calls.
//!
//! Used only by `LlmEntityTagger`. Callers hand it text whose emails and phone numbers are
//! already masked, and always expect a JSON answer back.

use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const MODEL: &str = "claude-sonnet-4-5";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 2048;
const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("response is not the expected JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response has no text content")]
    EmptyContent,
}

impl LlmError {
    /// Rate limits, server errors, and connection failures are worth another attempt.
    fn is_retryable(&self) -> bool {
        match self {
            LlmError::Transport(_) => true,
            LlmError::Status { status, .. } => *status == 429 || *status >= 500,
            LlmError::Decode(_) | LlmError::EmptyContent => false,
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenUsage {
    input_tokens: u32,
    output_tokens: u32,
}

impl MessagesResponse {
    fn first_text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Messages API client with retries for transient failures.
#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    api_url: String,
    api_key: String,
}

impl LlmClient {
    /// `request_timeout` bounds each HTTP attempt; the tagger's overall deadline is enforced by
    /// the caller.
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            http: Client::builder().timeout(request_timeout).build()?,
            api_url: api_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Sends one prompt and parses the first text block of the reply as `T`.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<T, LlmError> {
        let request = MessagesRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
            system,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let reply = self.send_with_retry(&request).await?;
        let text = reply.first_text().ok_or(LlmError::EmptyContent)?;
        Ok(serde_json::from_str(strip_json_fences(text))?)
    }

    async fn send_with_retry(
        &self,
        request: &MessagesRequest<'_>,
    ) -> Result<MessagesResponse, LlmError> {
        let mut attempt = 1;
        loop {
            match self.send_once(request).await {
                Ok(reply) => return Ok(reply),
                Err(e) if attempt < MAX_ATTEMPTS && e.is_retryable() => {
                    let delay = BACKOFF_BASE * 2u32.pow(attempt - 1);
                    warn!(
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "LLM request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, request: &MessagesRequest<'_>) -> Result<MessagesResponse, LlmError> {
        let response = self
            .http
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let reply: MessagesResponse = serde_json::from_str(&body)?;
        if let Some(usage) = &reply.usage {
            debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "LLM call succeeded"
            );
        }
        Ok(reply)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(stripped) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
    else {
        return text;
    };
    let stripped = stripped.trim_start();
    stripped
        .strip_suffix("```")
        .map(str::trim)
        .unwrap_or(stripped)
}
