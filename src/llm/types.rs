//! Provider-neutral request and response shapes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
        }
    }
}

/// One entry of the conversation handed to a provider.
///
/// The enrichment flow only ever sends instructions as system messages and
/// batches as user messages; nothing is carried over between requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// One generated alternative of a completion.
///
/// Chat providers always produce a single choice. Legacy completion providers
/// produce one choice per prompt, and `index` ties it back to that prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub index: usize,
    pub content: String,
    pub finish_reason: FinishReason,
}

/// What a provider answered for one request, normalized across backends.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Sorted by `index`.
    pub choices: Vec<Choice>,
    pub usage: Option<TokenUsage>,
}

impl CompletionResponse {
    /// A response with exactly one choice at index 0.
    pub fn single(content: impl Into<String>, finish_reason: FinishReason) -> Self {
        Self {
            choices: vec![Choice {
                index: 0,
                content: content.into(),
                finish_reason,
            }],
            usage: None,
        }
    }

    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.content.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    /// The model ran out of tokens; the JSON is probably cut short.
    MaxTokens,
    Other,
}

impl FinishReason {
    /// Map the `finish_reason` string both OpenAI endpoints send.
    pub(crate) fn from_wire(reason: Option<&str>) -> Self {
        match reason {
            Some("stop") | None => FinishReason::Stop,
            Some("length") => FinishReason::MaxTokens,
            Some(_) => FinishReason::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}
