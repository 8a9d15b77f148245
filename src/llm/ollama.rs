//! Local models served by Ollama.

use super::provider::{CompletionOptions, LlmError, LlmProvider};
use super::types::{CompletionResponse, FinishReason, Message, TokenUsage};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends enrichment batches to a local Ollama server through `/api/chat`.
///
/// Requests are never streamed, and when JSON output is requested the server
/// is asked for `format: "json"` so small models stay on the records envelope.
pub struct OllamaProvider {
    http: Client,
    endpoint: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    fn chat_request(&self, messages: &[Message], options: &CompletionOptions) -> ChatRequest<'_> {
        ChatRequest {
            model: &self.model,
            messages: messages.iter().map(WireMessage::from).collect(),
            stream: false,
            format: options.json_output.then_some("json"),
            options: SamplingOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, LlmError> {
        debug!(
            model = %self.model,
            endpoint = %self.endpoint,
            messages = messages.len(),
            "Posting batch to local model"
        );

        let response = self
            .http
            .post(format!("{}/api/chat", self.endpoint))
            .json(&self.chat_request(messages, options))
            .timeout(options.timeout)
            .send()
            .await
            .map_err(LlmError::from_send)?;

        if !response.status().is_success() {
            return Err(LlmError::from_status(response).await);
        }

        let reply: ChatReply = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Ollama chat reply: {}", e)))?;

        let finish_reason = match reply.done_reason.as_deref() {
            Some("length") => FinishReason::MaxTokens,
            _ => FinishReason::Stop,
        };
        let usage = TokenUsage::new(
            reply.prompt_eval_count.unwrap_or_default(),
            reply.eval_count.unwrap_or_default(),
        );
        debug!(?finish_reason, tokens = usage.total_tokens, "Local model answered");

        let mut completion = CompletionResponse::single(reply.message.content, finish_reason);
        completion.usage = Some(usage);
        Ok(completion)
    }

    /// Lists the pulled models. A model that has not been pulled yet is only
    /// a warning, since Ollama pulls on first use when configured to.
    async fn health_check(&self) -> Result<(), LlmError> {
        let response = self
            .http
            .get(format!("{}/api/tags", self.endpoint))
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await
            .map_err(LlmError::from_send)?;

        if !response.status().is_success() {
            return Err(LlmError::from_status(response).await);
        }

        let pulled: PulledModels = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Ollama model list: {}", e)))?;

        if !pulled.contains(&self.model) {
            warn!(
                model = %self.model,
                pulled = ?pulled.names(),
                "Model has not been pulled on this Ollama server"
            );
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: SamplingOptions,
}

#[derive(Serialize)]
struct SamplingOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        }
    }
}

#[derive(Deserialize)]
struct ChatReply {
    message: WireMessage,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Deserialize)]
struct PulledModels {
    models: Vec<PulledModel>,
}

#[derive(Deserialize)]
struct PulledModel {
    name: String,
}

impl PulledModels {
    fn contains(&self, model: &str) -> bool {
        self.models.iter().any(|m| m.name == model)
    }

    fn names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }
}
