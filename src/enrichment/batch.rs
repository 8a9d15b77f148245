//! Partitioning of descriptions into request-sized batches.

use crate::collection::DescriptionMap;
use serde::Serialize;
use std::num::NonZeroUsize;

/// One `{id, description}` pair as sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchEntry {
    pub id: String,
    pub description: String,
}

impl BatchEntry {
    /// The entry as a standalone JSON object.
    pub fn to_json(&self) -> String {
        // A struct of two strings always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A bounded, ordered slice of the description map, sent as one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Zero-based position of this batch in submission order.
    pub index: usize,
    pub entries: Vec<BatchEntry>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    /// Original description sent for `id`, if it belongs to this batch.
    pub fn description_for(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.description.as_str())
    }

    /// The batch as a single JSON array literal, the user turn of a chat request.
    pub fn to_json_array(&self) -> String {
        serde_json::to_string(&self.entries).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Number of batches needed for `count` entries: `ceil(count / batch_size)`.
pub fn batch_count(count: usize, batch_size: NonZeroUsize) -> usize {
    count.div_ceil(batch_size.get())
}

/// Split descriptions into consecutive batches of at most `batch_size` entries.
///
/// Batches partition the input in map order: no entry is dropped or repeated,
/// and only the last batch may be shorter than `batch_size`.
pub fn build_batches(descriptions: &DescriptionMap, batch_size: NonZeroUsize) -> Vec<Batch> {
    let entries: Vec<BatchEntry> = descriptions
        .iter()
        .map(|(id, description)| BatchEntry {
            id: id.to_string(),
            description: description.to_string(),
        })
        .collect();

    entries
        .chunks(batch_size.get())
        .enumerate()
        .map(|(index, chunk)| Batch {
            index,
            entries: chunk.to_vec(),
        })
        .collect()
}
