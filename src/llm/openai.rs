//! OpenAI chat completions.
//!
//! Any service speaking the `/chat/completions` dialect with `response_format`
//! works here, which is how the tests point it at a local mock.

use super::provider::{CompletionOptions, LlmError, LlmProvider};
use super::types::{CompletionResponse, FinishReason, Message, TokenUsage};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const MODEL_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP plumbing shared by the chat and legacy OpenAI providers.
pub(super) struct OpenAIEndpoint {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAIEndpoint {
    pub(super) fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// POST `body` to `path` and decode the JSON answer.
    pub(super) async fn post_json<B, R>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<R, LlmError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .authorized(self.http.post(format!("{}{}", self.base_url, path)))
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(LlmError::from_send)?;

        if !response.status().is_success() {
            return Err(LlmError::from_status(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("{} answer: {}", path, e)))
    }

    /// Succeeds when `GET {path}` answers with a success status.
    pub(super) async fn probe(&self, path: &str) -> Result<(), LlmError> {
        let response = self
            .authorized(self.http.get(format!("{}{}", self.base_url, path)))
            .timeout(MODEL_LOOKUP_TIMEOUT)
            .send()
            .await
            .map_err(LlmError::from_send)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(LlmError::from_status(response).await)
        }
    }
}

/// Usage block as both OpenAI endpoints report it.
#[derive(Debug, Deserialize)]
pub(super) struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl From<WireUsage> for TokenUsage {
    fn from(usage: WireUsage) -> Self {
        TokenUsage::new(usage.prompt_tokens, usage.completion_tokens)
    }
}

/// Chat model behind `/chat/completions`, e.g. `gpt-4o`.
pub struct OpenAIProvider {
    endpoint: OpenAIEndpoint,
    model: String,
}

impl OpenAIProvider {
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

    fn chat_request<'a>(
        &'a self,
        messages: &'a [Message],
        options: &CompletionOptions,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: messages.iter().map(ChatMessage::from).collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            response_format: options.json_output.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
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
            messages = messages.len(),
            json_output = options.json_output,
            "Posting batch to chat completions"
        );

        let reply: ChatReply = self
            .endpoint
            .post_json(
                "/chat/completions",
                &self.chat_request(messages, options),
                options.timeout,
            )
            .await?;

        // n is never set, so anything past the first choice is noise
        let first = reply
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("chat reply has no choices".to_string()))?;
        let finish_reason = FinishReason::from_wire(first.finish_reason.as_deref());
        debug!(?finish_reason, "Chat completion received");

        let mut completion =
            CompletionResponse::single(first.message.content.unwrap_or_default(), finish_reason);
        completion.usage = reply.usage.map(Into::into);
        Ok(completion)
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        self.endpoint.probe(&format!("/models/{}", self.model)).await
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a Message> for ChatMessage<'a> {
    fn from(message: &'a Message) -> Self {
        Self {
            role: message.role.as_str(),
            content: &message.content,
        }
    }
}

#[derive(Deserialize)]
struct ChatReply {
    choices: Vec<ChatChoice>,
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatReplyMessage {
    content: Option<String>,
}
