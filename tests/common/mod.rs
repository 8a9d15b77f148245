//! Common test infrastructure
//!
//! Fixtures for the end-to-end tests plus a mock OpenAI chat server that
//! answers every batch from the descriptions it was sent.

mod fixtures;
mod mock_openai;

pub use fixtures::*;
pub use mock_openai::MockOpenAI;
