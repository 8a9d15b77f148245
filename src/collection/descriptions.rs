//! Extraction of vinyl color descriptions from collection records.

use super::models::CollectionRecord;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Separator used when a release has several qualifying vinyl formats.
pub const DESCRIPTION_SEPARATOR: &str = " and ";

/// Ordered mapping from record id to its joined vinyl description.
///
/// Iteration follows insertion order. Re-inserting an id replaces its value
/// but keeps its original position. Only ids with a non-empty description
/// are ever stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptionMap {
    entries: Vec<(String, String)>,
    positions: HashMap<String, usize>,
}

impl DescriptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, description: impl Into<String>) {
        let id = id.into();
        let description = description.into();
        match self.positions.get(&id) {
            Some(&pos) => self.entries[pos].1 = description,
            None => {
                self.positions.insert(id.clone(), self.entries.len());
                self.entries.push((id, description));
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.positions
            .get(id)
            .map(|&pos| self.entries[pos].1.as_str())
    }

    pub fn contains_key(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Keep only the given ids, preserving order.
    pub fn retain_ids(&self, ids: &HashSet<String>) -> DescriptionMap {
        let mut retained = DescriptionMap::new();
        for (id, description) in self.iter() {
            if ids.contains(id) {
                retained.insert(id, description);
            }
        }
        retained
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DescriptionMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = DescriptionMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Build the description map for a collection.
///
/// A format qualifies when its name is "vinyl" (any case) and it carries a
/// non-empty `text`. Qualifying texts of one record are joined with
/// [`DESCRIPTION_SEPARATOR`] in format order. Records without a qualifying
/// format, or without an id, are left out.
pub fn extract_descriptions(collection: &[CollectionRecord]) -> DescriptionMap {
    let mut descriptions = DescriptionMap::new();

    for record in collection {
        let Some(id) = &record.id else {
            debug!("Skipping collection record without an id");
            continue;
        };

        let texts: Vec<&str> = record
            .basic_information
            .formats
            .iter()
            .filter(|f| f.is_vinyl())
            .filter_map(|f| f.text.as_deref())
            .filter(|t| !t.is_empty())
            .collect();

        if !texts.is_empty() {
            descriptions.insert(id.to_string(), texts.join(DESCRIPTION_SEPARATOR));
        }
    }

    debug!(
        records = collection.len(),
        described = descriptions.len(),
        "Extracted vinyl descriptions"
    );

    descriptions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::models::Format;
    use serde_json::json;

    fn fixture_collection() -> Vec<CollectionRecord> {
        serde_json::from_value(json!([
            {
                "id": 123,
                "basic_information": {
                    "formats": [{
                        "name": "Vinyl",
                        "qty": "1",
                        "text": "Purple Marbled Translucent, 180 Gram",
                        "descriptions": ["LP", "Album", "Limited Edition"]
                    }]
                }
            },
            {
                "id": 456,
                "basic_information": {
                    "formats": [
                        {
                            "name": "Vinyl",
                            "qty": "1",
                            "text": "Black/Silver Swirl",
                            "descriptions": ["LP", "Single Sided", "EP", "Etched", "Limited Edition"]
                        },
                        {"name": "Vinyl", "qty": "1", "text": "Silver/red swirl"}
                    ]
                }
            },
            {
                "id": 567,
                "basic_information": {
                    "formats": [{
                        "name": "Vinyl",
                        "qty": "4",
                        "descriptions": ["LP", "Limited Edition", "Remastered"]
                    }]
                }
            }
        ]))
        .unwrap()
    }

    #[test]
    fn test_contains_release_ids_as_keys() {
        let descriptions = extract_descriptions(&fixture_collection());
        assert!(descriptions.contains_key("123"));
        assert!(descriptions.contains_key("456"));
    }

    #[test]
    fn test_single_format_description() {
        let descriptions = extract_descriptions(&fixture_collection());
        assert_eq!(
            descriptions.get("123"),
            Some("Purple Marbled Translucent, 180 Gram")
        );
    }

    #[test]
    fn test_multiple_formats_joined_with_and() {
        let descriptions = extract_descriptions(&fixture_collection());
        assert_eq!(
            descriptions.get("456"),
            Some("Black/Silver Swirl and Silver/red swirl")
        );
    }

    #[test]
    fn test_filters_formats_without_text() {
        let descriptions = extract_descriptions(&fixture_collection());
        assert!(!descriptions.contains_key("567"));
        assert_eq!(descriptions.len(), 2);
    }

    #[test]
    fn test_ignores_non_vinyl_and_empty_text() {
        let collection = vec![
            CollectionRecord {
                id: Some(1.into()),
                basic_information: crate::collection::models::BasicInformation {
                    formats: vec![
                        Format {
                            name: Some("CD".to_string()),
                            text: Some("Picture Disc".to_string()),
                            ..Default::default()
                        },
                        Format::vinyl(Some("")),
                    ],
                    ..Default::default()
                },
                ..Default::default()
            },
            CollectionRecord {
                id: Some(2.into()),
                basic_information: crate::collection::models::BasicInformation {
                    formats: vec![
                        Format {
                            name: Some("Cassette".to_string()),
                            text: Some("Red shell".to_string()),
                            ..Default::default()
                        },
                        Format {
                            name: Some("vInYl".to_string()),
                            text: Some("Red".to_string()),
                            ..Default::default()
                        },
                    ],
                    ..Default::default()
                },
                ..Default::default()
            },
        ];

        let descriptions = extract_descriptions(&collection);
        assert_eq!(descriptions.len(), 1);
        assert_eq!(descriptions.get("2"), Some("Red"));
    }

    #[test]
    fn test_records_without_id_or_formats_are_skipped() {
        let collection: Vec<CollectionRecord> = serde_json::from_value(json!([
            {"basic_information": {"formats": [{"name": "Vinyl", "text": "Blue"}]}},
            {"id": 9},
            {"id": 10, "basic_information": null}
        ]))
        .unwrap();
        assert!(extract_descriptions(&collection).is_empty());
    }

    #[test]
    fn test_malformed_format_keeps_vinyl_neighbour() {
        let collection: Vec<CollectionRecord> = serde_json::from_value(json!([
            {"id": 1, "basic_information": {"formats": ["garbage", {"name": "Vinyl", "text": "Red"}]}}
        ]))
        .unwrap();
        let descriptions = extract_descriptions(&collection);
        assert_eq!(descriptions.len(), 1);
        assert_eq!(descriptions.get("1"), Some("Red"));
    }

    #[test]
    fn test_preserves_collection_order() {
        let collection: Vec<CollectionRecord> = serde_json::from_value(json!([
            {"id": 30, "basic_information": {"formats": [{"name": "Vinyl", "text": "C"}]}},
            {"id": 10, "basic_information": {"formats": [{"name": "Vinyl", "text": "A"}]}},
            {"id": "20", "basic_information": {"formats": [{"name": "Vinyl", "text": "B"}]}}
        ]))
        .unwrap();
        let descriptions = extract_descriptions(&collection);
        let ids: Vec<&str> = descriptions.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["30", "10", "20"]);
    }

    #[test]
    fn test_duplicate_ids_keep_first_position() {
        let mut map = DescriptionMap::new();
        map.insert("1", "Red");
        map.insert("2", "Blue");
        map.insert("1", "Green");
        let entries: Vec<(&str, &str)> = map.iter().collect();
        assert_eq!(entries, vec![("1", "Green"), ("2", "Blue")]);
    }

    #[test]
    fn test_retain_ids() {
        let map: DescriptionMap = vec![("1", "Red"), ("2", "Blue"), ("3", "Green")]
            .into_iter()
            .collect();
        let keep: HashSet<String> = ["3", "1", "99"].iter().map(|s| s.to_string()).collect();
        let retained = map.retain_ids(&keep);
        let ids: Vec<&str> = retained.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }
}
