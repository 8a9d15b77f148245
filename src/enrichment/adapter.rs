//! Response adapters reconciling the response shapes of different model families.
//!
//! Chat models answer a whole batch with one `{"records": [...]}` object.
//! Legacy completion models answer with one choice per prompt, each a bare
//! JSON object. An adapter knows both how to phrase a batch as messages and
//! how to pull raw records back out of the matching response, so the
//! normalizer never branches on shape.

use super::batch::Batch;
use super::instructions::{single_record_instructions, system_instructions};
use super::models::RawEnrichment;
use crate::llm::{CompletionResponse, Message};
use serde_json::Value;
use thiserror::Error;

/// A single record (or a whole batch envelope) that could not be used.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("batch {batch}: response has no content")]
    MissingContent { batch: usize },

    #[error("batch {batch}: content is not valid JSON: {message}")]
    InvalidJson { batch: usize, message: String },

    #[error("batch {batch}: response has no records array")]
    MissingRecords { batch: usize },

    #[error("batch {batch}, item {item}: {message}")]
    InvalidItem {
        batch: usize,
        item: usize,
        message: String,
    },

    #[error("batch {batch}, item {item}: record has no id")]
    MissingId { batch: usize, item: usize },

    #[error("batch {batch}: record id {id} was not part of the request")]
    UnknownId { batch: usize, id: String },

    #[error("batch {batch}: record id {id} was answered more than once")]
    DuplicateId { batch: usize, id: String },

    #[error("batch {batch}: choice {item} has no matching request item")]
    UnexpectedChoice { batch: usize, item: usize },
}

/// Which response shape a provider produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// One choice holding `{"records": [...]}` for the whole batch.
    RecordsEnvelope,
    /// One choice per batch item, each a bare JSON object.
    PerChoice,
}

impl ResponseShape {
    pub fn adapter(self) -> Box<dyn ResponseAdapter> {
        match self {
            ResponseShape::RecordsEnvelope => Box::new(RecordsEnvelopeAdapter),
            ResponseShape::PerChoice => Box::new(PerChoiceAdapter),
        }
    }
}

/// Converts batches to requests and responses back to raw records.
pub trait ResponseAdapter: Send + Sync {
    fn shape(&self) -> ResponseShape;

    /// System preamble suited to this shape.
    fn instructions(&self) -> String;

    /// Messages for one batch request.
    fn build_messages(&self, instructions: &str, batch: &Batch) -> Vec<Message>;

    /// Raw records of one batch. Each item fails independently.
    fn extract(
        &self,
        batch: &Batch,
        response: &CompletionResponse,
    ) -> Vec<Result<RawEnrichment, ParseError>>;
}

fn parse_item(value: Value, batch: usize, item: usize) -> Result<RawEnrichment, ParseError> {
    if !value.is_object() {
        return Err(ParseError::InvalidItem {
            batch,
            item,
            message: "record is not a JSON object".to_string(),
        });
    }
    serde_json::from_value(value).map_err(|e| ParseError::InvalidItem {
        batch,
        item,
        message: e.to_string(),
    })
}

/// Adapter for chat models answering with `{"records": [...]}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordsEnvelopeAdapter;

impl ResponseAdapter for RecordsEnvelopeAdapter {
    fn shape(&self) -> ResponseShape {
        ResponseShape::RecordsEnvelope
    }

    fn instructions(&self) -> String {
        system_instructions()
    }

    fn build_messages(&self, instructions: &str, batch: &Batch) -> Vec<Message> {
        vec![
            Message::system(instructions),
            Message::user(batch.to_json_array()),
        ]
    }

    fn extract(
        &self,
        batch: &Batch,
        response: &CompletionResponse,
    ) -> Vec<Result<RawEnrichment, ParseError>> {
        let index = batch.index;
        let Some(content) = response.first_content().filter(|c| !c.trim().is_empty()) else {
            return vec![Err(ParseError::MissingContent { batch: index })];
        };

        let parsed: Value = match serde_json::from_str(content.trim()) {
            Ok(v) => v,
            Err(e) => {
                return vec![Err(ParseError::InvalidJson {
                    batch: index,
                    message: e.to_string(),
                })]
            }
        };

        // Some models skip the envelope and answer with the bare array.
        let records = match parsed {
            Value::Object(mut obj) => match obj.remove("records") {
                Some(Value::Array(records)) => records,
                _ => return vec![Err(ParseError::MissingRecords { batch: index })],
            },
            Value::Array(records) => records,
            _ => return vec![Err(ParseError::MissingRecords { batch: index })],
        };

        records
            .into_iter()
            .enumerate()
            .map(|(item, value)| parse_item(value, index, item))
            .collect()
    }
}

/// Adapter for legacy completion models answering one bare object per prompt.
///
/// Choices are matched to batch entries by their prompt index, never by their
/// position in the response, so a missing choice cannot shift later answers.
/// An item that omits its id inherits the id of the entry it answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerChoiceAdapter;

impl ResponseAdapter for PerChoiceAdapter {
    fn shape(&self) -> ResponseShape {
        ResponseShape::PerChoice
    }

    fn instructions(&self) -> String {
        single_record_instructions()
    }

    fn build_messages(&self, instructions: &str, batch: &Batch) -> Vec<Message> {
        std::iter::once(Message::system(instructions))
            .chain(batch.entries.iter().map(|e| Message::user(e.to_json())))
            .collect()
    }

    fn extract(
        &self,
        batch: &Batch,
        response: &CompletionResponse,
    ) -> Vec<Result<RawEnrichment, ParseError>> {
        let index = batch.index;
        response
            .choices
            .iter()
            .map(|choice| {
                let item = choice.index;
                let entry = batch
                    .entries
                    .get(item)
                    .ok_or(ParseError::UnexpectedChoice { batch: index, item })?;
                let value: Value =
                    serde_json::from_str(choice.content.trim()).map_err(|e| {
                        ParseError::InvalidJson {
                            batch: index,
                            message: format!("choice {}: {}", item, e),
                        }
                    })?;
                let mut raw = parse_item(value, index, item)?;
                if raw.id.is_none() {
                    raw.id = Some(crate::collection::RecordId::Text(entry.id.clone()));
                }
                Ok(raw)
            })
            .collect()
    }
}
