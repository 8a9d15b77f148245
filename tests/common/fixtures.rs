use serde_json::{json, Value};
use vinyl_color_enricher::collection::CollectionRecord;

/// Release whose model answer is always unusable.
pub const BROKEN_RELEASE_ID: &str = "777";

fn vinyl(text: &str) -> Value {
    json!({"name": "Vinyl", "qty": "1", "text": text, "descriptions": ["LP"]})
}

/// A small collection covering the extraction edge cases.
pub fn collection_json() -> Value {
    json!([
        {"id": 123, "basic_information": {"id": 123, "title": "Purple", "formats": [vinyl("Purple Marbled Translucent, 180 Gram")]}},
        {"id": 456, "basic_information": {"id": 456, "formats": [vinyl("Black/Silver Swirl"), vinyl("Silver/red swirl")]}},
        {"id": 567, "basic_information": {"id": 567, "formats": [{"name": "Vinyl", "qty": "4", "descriptions": ["LP", "Remastered"]}]}},
        {"id": 600, "basic_information": {"id": 600, "formats": [{"name": "CD", "text": "Red"}]}},
        {"id": 777, "basic_information": {"id": 777, "formats": [vinyl("Glow in the dark")]}},
        {"id": 810, "basic_information": {"id": 810, "formats": [vinyl("Clear")]}},
        {"id": 934, "basic_information": {"id": 934, "formats": [{"name": "vinyl", "text": "Gatefold"}]}},
        {"id": "1001", "basic_information": {"formats": [vinyl("Hot Pink")]}}
    ])
}

pub fn collection() -> Vec<CollectionRecord> {
    serde_json::from_value(collection_json()).unwrap()
}

/// Collection without the release the mock server cannot answer.
pub fn healthy_collection() -> Vec<CollectionRecord> {
    collection()
        .into_iter()
        .filter(|r| r.id.as_ref().map(|id| id.to_string()) != Some(BROKEN_RELEASE_ID.to_string()))
        .collect()
}
