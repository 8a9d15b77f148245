//! The seam between the enrichment requester and a completion backend.

use super::types::{CompletionResponse, Message};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Per-request knobs. Enrichment runs want repeatable answers, so the
/// temperature defaults to zero and JSON output is on.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Applied to each HTTP request; a hung backend surfaces as [`LlmError::Timeout`].
    pub timeout: Duration,
    /// Ignored by backends without a JSON mode.
    pub json_output: bool,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: None,
            timeout: Duration::from_secs(120),
            json_output: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Could not reach the model: {0}")]
    Connection(String),

    #[error("Model endpoint answered {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unreadable model response: {0}")]
    InvalidResponse(String),

    #[error("Cannot build request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited by the model endpoint")]
    RateLimited,

    #[error("Model request timed out")]
    Timeout,
}

impl LlmError {
    pub(super) fn from_send(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Connection(e.to_string())
        }
    }

    /// Consumes a non-success response, keeping its body as the message.
    pub(super) async fn from_status(response: reqwest::Response) -> Self {
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return LlmError::RateLimited;
        }
        LlmError::Api {
            status: status.as_u16(),
            message: response.text().await.unwrap_or_default(),
        }
    }
}

/// A completion backend the enrichment requester can send batches to.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short backend name used in logs and report file names.
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    /// Send one request. Instructions arrive as system messages and the
    /// serialized batch as one or more user messages.
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, LlmError>;

    /// Cheap reachability probe run before a long batch job.
    async fn health_check(&self) -> Result<(), LlmError>;
}
