//! Enrichment records: the model-facing raw shape and the canonical output.

use crate::collection::RecordId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Accept a string or a number and store it as a string.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let id = RecordId::deserialize(deserializer)?;
    Ok(id.to_string())
}

/// A missing or null description reads as empty.
fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Canonical enrichment output for one release.
///
/// Every key is always serialized; a value that was not found is `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentRecord {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub description: String,
    #[serde(default)]
    pub human_readable_color: Option<String>,
    #[serde(default)]
    pub css_readable_colors: Option<Vec<String>>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub texture: Option<String>,
}

impl EnrichmentRecord {
    /// A record with every enrichment field set to null.
    pub fn empty(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            human_readable_color: None,
            css_readable_colors: None,
            pattern: None,
            texture: None,
        }
    }

    /// Whether the model found any machine-usable data (colors, pattern or texture).
    pub fn has_enrichment(&self) -> bool {
        self.css_readable_colors
            .as_ref()
            .is_some_and(|c| !c.is_empty())
            || self.pattern.is_some()
            || self.texture.is_some()
    }
}

/// One record as a model returned it, before validation.
///
/// Models of different generations disagree on casing, so both camelCase and
/// snake_case names are accepted; when a model sends both, the camelCase value
/// wins. Value-typed fields are checked by the normalizer rather than rejected
/// here, and `null` counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct RawEnrichment {
    pub id: Option<RecordId>,
    pub description: Option<String>,
    pub human_readable_color: Option<Value>,
    pub css_readable_colors: Option<Value>,
    pub pattern: Option<Value>,
    pub texture: Option<Value>,
    /// Older prompts asked for one combined field.
    pub pattern_texture: Option<Value>,
}

impl From<Map<String, Value>> for RawEnrichment {
    fn from(mut fields: Map<String, Value>) -> Self {
        let mut take = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| fields.remove(*key))
                .find(|value| !value.is_null())
        };

        Self {
            id: take(&["id"]).and_then(|v| serde_json::from_value(v).ok()),
            description: take(&["description"]).and_then(|v| v.as_str().map(str::to_string)),
            human_readable_color: take(&["humanReadableColor", "human_readable_color"]),
            css_readable_colors: take(&["cssReadableColors", "css_readable_colors"]),
            pattern: take(&["pattern"]),
            texture: take(&["texture"]),
            pattern_texture: take(&["pattern_texture", "patternTexture"]),
        }
    }
}
