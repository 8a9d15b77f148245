//! LLM provider abstraction layer.
//!
//! This module provides a trait-based abstraction for completion backends,
//! allowing the enrichment pipeline to run against OpenAI chat models, legacy
//! OpenAI completion models, or a local Ollama server.

mod ollama;
mod openai;
mod openai_legacy;
mod provider;
mod types;

pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
pub use openai_legacy::OpenAILegacyProvider;
pub use provider::{CompletionOptions, LlmError, LlmProvider};
pub use types::{Choice, CompletionResponse, FinishReason, Message, MessageRole, TokenUsage};
