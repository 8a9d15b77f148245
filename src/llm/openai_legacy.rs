//! Legacy OpenAI completions provider (`/completions` with a prompt list).
//!
//! Legacy completion models have no chat roles and no JSON response mode.
//! System messages are folded into a preamble that is prefixed to every user
//! message, and each user message becomes one prompt. The endpoint answers
//! with one choice per prompt, tagged by prompt index.

use super::openai::{OpenAIEndpoint, WireUsage};
use super::provider::{CompletionOptions, LlmError, LlmProvider};
use super::types::{Choice, CompletionResponse, FinishReason, Message, MessageRole};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Token bound per prompt when the caller leaves `max_tokens` unset. The
/// endpoint's own default of 16 would cut every record short.
const DEFAULT_MAX_TOKENS: u32 = 256;

/// Instruct-style model behind `/completions`, e.g. `gpt-3.5-turbo-instruct`.
pub struct OpenAILegacyProvider {
    endpoint: OpenAIEndpoint,
    model: String,
}

impl OpenAILegacyProvider {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            endpoint: OpenAIEndpoint::new(base_url, api_key),
            model: model.into(),
        }
    }

    /// One prompt per user message, each prefixed with the system preamble.
    fn to_prompts(messages: &[Message]) -> Vec<String> {
        let preamble = messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .map(|m| match preamble.as_str() {
                "" => m.content.clone(),
                preamble => format!("{}\n\n{}", preamble, m.content),
            })
            .collect()
    }
}

#[async_trait]
impl LlmProvider for OpenAILegacyProvider {
    fn name(&self) -> &str {
        "openai-legacy"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, LlmError> {
        let prompt = Self::to_prompts(messages);
        if prompt.is_empty() {
            return Err(LlmError::InvalidRequest(
                "no user message to turn into a prompt".to_string(),
            ));
        }
        debug!(model = %self.model, prompts = prompt.len(), "Posting prompts to completions");

        let request = PromptRequest {
            model: &self.model,
            prompt,
            temperature: options.temperature,
            max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        };
        let reply: PromptReply = self
            .endpoint
            .post_json("/completions", &request, options.timeout)
            .await?;

        let mut choices: Vec<Choice> = reply
            .choices
            .into_iter()
            .map(|c| Choice {
                index: c.index,
                content: c.text,
                finish_reason: FinishReason::from_wire(c.finish_reason.as_deref()),
            })
            .collect();
        choices.sort_by_key(|c| c.index);
        debug!(choices = choices.len(), "Completions received");

        Ok(CompletionResponse {
            choices,
            usage: reply.usage.map(Into::into),
        })
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        self.endpoint.probe(&format!("/models/{}", self.model)).await
    }
}

#[derive(Serialize)]
struct PromptRequest<'a> {
    model: &'a str,
    prompt: Vec<String>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct PromptReply {
    choices: Vec<PromptChoice>,
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct PromptChoice {
    text: String,
    #[serde(default)]
    index: usize,
    finish_reason: Option<String>,
}
