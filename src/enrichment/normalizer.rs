//! Validation of raw model records into canonical [`EnrichmentRecord`]s.
//!
//! Rules applied to every record regardless of which model produced it:
//! - `id` is coerced to a string and must belong to the batch it answers
//! - `description` is always the description that was sent, verbatim
//! - `cssReadableColors` holds lowercase CSS colors only, never
//!   "marble", "marbled" or "clear", and is null when empty
//! - "clear" found among the colors moves to `texture`
//! - `pattern` and `texture` are lowercase, or null
//! - missing values are null, never empty strings

use super::adapter::{ParseError, ResponseAdapter};
use super::batch::Batch;
use super::models::{EnrichmentRecord, RawEnrichment};
use crate::llm::CompletionResponse;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Tokens models like to put in colors that are really patterns.
const NON_COLOR_TOKENS: &[&str] = &["marble", "marbled"];

/// Placeholder strings some models use instead of null.
const NULL_WORDS: &[&str] = &["null", "none", "n/a"];

const CLEAR: &str = "clear";

lazy_static! {
    static ref CSS_NAMED_COLORS: HashSet<&'static str> = [
        "aliceblue", "antiquewhite", "aqua", "aquamarine", "azure", "beige", "bisque", "black",
        "blanchedalmond", "blue", "blueviolet", "brown", "burlywood", "cadetblue", "chartreuse",
        "chocolate", "coral", "cornflowerblue", "cornsilk", "crimson", "cyan", "darkblue",
        "darkcyan", "darkgoldenrod", "darkgray", "darkgreen", "darkgrey", "darkkhaki",
        "darkmagenta", "darkolivegreen", "darkorange", "darkorchid", "darkred", "darksalmon",
        "darkseagreen", "darkslateblue", "darkslategray", "darkslategrey", "darkturquoise",
        "darkviolet", "deeppink", "deepskyblue", "dimgray", "dimgrey", "dodgerblue", "firebrick",
        "floralwhite", "forestgreen", "fuchsia", "gainsboro", "ghostwhite", "gold", "goldenrod",
        "gray", "green", "greenyellow", "grey", "honeydew", "hotpink", "indianred", "indigo",
        "ivory", "khaki", "lavender", "lavenderblush", "lawngreen", "lemonchiffon", "lightblue",
        "lightcoral", "lightcyan", "lightgoldenrodyellow", "lightgray", "lightgreen", "lightgrey",
        "lightpink", "lightsalmon", "lightseagreen", "lightskyblue", "lightslategray",
        "lightslategrey", "lightsteelblue", "lightyellow", "lime", "limegreen", "linen",
        "magenta", "maroon", "mediumaquamarine", "mediumblue", "mediumorchid", "mediumpurple",
        "mediumseagreen", "mediumslateblue", "mediumspringgreen", "mediumturquoise",
        "mediumvioletred", "midnightblue", "mintcream", "mistyrose", "moccasin", "navajowhite",
        "navy", "oldlace", "olive", "olivedrab", "orange", "orangered", "orchid",
        "palegoldenrod", "palegreen", "paleturquoise", "palevioletred", "papayawhip",
        "peachpuff", "peru", "pink", "plum", "powderblue", "purple", "rebeccapurple", "red",
        "rosybrown", "royalblue", "saddlebrown", "salmon", "sandybrown", "seagreen", "seashell",
        "sienna", "silver", "skyblue", "slateblue", "slategray", "slategrey", "snow",
        "springgreen", "steelblue", "tan", "teal", "thistle", "tomato", "turquoise", "violet",
        "wheat", "white", "whitesmoke", "yellow", "yellowgreen",
    ]
    .into_iter()
    .collect();
    static ref HEX_COLOR: Regex =
        Regex::new(r"^#(?:[0-9a-f]{3}|[0-9a-f]{4}|[0-9a-f]{6}|[0-9a-f]{8})$")
            .expect("Failed to compile hex color pattern");
    static ref FUNCTIONAL_COLOR: Regex =
        Regex::new(r"^(?:rgb|rgba|hsl|hsla)\([0-9.,%\s/deg]+\)$")
            .expect("Failed to compile functional color pattern");
}

/// Whether `token` (already lowercase) is a valid CSS color value.
pub fn is_css_color(token: &str) -> bool {
    CSS_NAMED_COLORS.contains(token) || HEX_COLOR.is_match(token) || FUNCTIONAL_COLOR.is_match(token)
}

/// Read a string-ish field: strings are trimmed, arrays of strings joined,
/// anything else (and placeholders like "none") is absent.
fn text_value(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        _ => return None,
    };
    if text.is_empty() || NULL_WORDS.contains(&text.to_lowercase().as_str()) {
        None
    } else {
        Some(text)
    }
}

fn lowercase_text(value: Option<&Value>) -> Option<String> {
    text_value(value).map(|s| s.to_lowercase())
}

/// Clean a colors value. Returns the accepted colors and whether "clear" was seen.
fn css_colors(value: Option<&Value>) -> (Vec<String>, bool) {
    let tokens: Vec<String> = match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };

    let mut colors: Vec<String> = Vec::new();
    let mut saw_clear = false;

    for token in tokens {
        let token = token.trim().to_lowercase();
        if token.is_empty() || NON_COLOR_TOKENS.contains(&token.as_str()) {
            continue;
        }
        if token == CLEAR {
            saw_clear = true;
            continue;
        }

        let color = if is_css_color(&token) {
            token
        } else {
            // "hot pink" -> "hotpink"
            let collapsed: String = token.split_whitespace().collect();
            if is_css_color(&collapsed) {
                collapsed
            } else {
                debug!(token = %token, "Dropping token that is not a css color");
                continue;
            }
        };

        if !colors.contains(&color) {
            colors.push(color);
        }
    }

    (colors, saw_clear)
}

/// Validate one raw record against the batch it answers.
pub fn normalize_record(batch: &Batch, raw: RawEnrichment) -> Result<EnrichmentRecord, ParseError> {
    let id = raw
        .id
        .as_ref()
        .map(|id| id.to_string())
        .ok_or(ParseError::MissingId {
            batch: batch.index,
            item: 0,
        })?;

    let description = batch
        .description_for(&id)
        .ok_or_else(|| ParseError::UnknownId {
            batch: batch.index,
            id: id.clone(),
        })?
        .to_string();

    let (colors, saw_clear) = css_colors(raw.css_readable_colors.as_ref());

    let pattern = lowercase_text(raw.pattern.as_ref());
    let mut texture = lowercase_text(raw.texture.as_ref())
        .or_else(|| lowercase_text(raw.pattern_texture.as_ref()));
    if saw_clear && texture.is_none() {
        texture = Some(CLEAR.to_string());
    }

    Ok(EnrichmentRecord {
        id,
        description,
        human_readable_color: text_value(raw.human_readable_color.as_ref()),
        css_readable_colors: (!colors.is_empty()).then_some(colors),
        pattern,
        texture,
    })
}

/// Normalize every successful batch response into one flat record list.
///
/// Items that fail to parse or validate are logged and dropped; they never
/// abort the batch or the run. An id answered twice within one batch keeps
/// its first answer. Output follows batch order, then item order.
pub fn normalize(
    adapter: &dyn ResponseAdapter,
    responses: &[(Batch, CompletionResponse)],
) -> Vec<EnrichmentRecord> {
    let mut records = Vec::new();
    let mut dropped = 0usize;

    for (batch, response) in responses {
        let mut answered: HashSet<String> = HashSet::new();
        for (item, extracted) in adapter.extract(batch, response).into_iter().enumerate() {
            let result = extracted
                .and_then(|raw| {
                    normalize_record(batch, raw).map_err(|e| match e {
                        ParseError::MissingId { batch, .. } => ParseError::MissingId { batch, item },
                        other => other,
                    })
                })
                .and_then(|record| {
                    // the first answer for an id wins
                    if answered.insert(record.id.clone()) {
                        Ok(record)
                    } else {
                        Err(ParseError::DuplicateId {
                            batch: batch.index,
                            id: record.id,
                        })
                    }
                });
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    dropped += 1;
                    warn!(error = %e, "Dropping enrichment item");
                }
            }
        }
    }

    if dropped > 0 {
        warn!(
            dropped,
            kept = records.len(),
            "Some enrichment items could not be parsed"
        );
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::adapter::{PerChoiceAdapter, RecordsEnvelopeAdapter};
    use crate::enrichment::batch::BatchEntry;
    use crate::llm::{Choice, FinishReason};
    use serde_json::json;

    fn batch(index: usize, entries: &[(&str, &str)]) -> Batch {
        Batch {
            index,
            entries: entries
                .iter()
                .map(|(id, description)| BatchEntry {
                    id: id.to_string(),
                    description: description.to_string(),
                })
                .collect(),
        }
    }

    fn raw(value: Value) -> RawEnrichment {
        serde_json::from_value(value).unwrap()
    }

    fn chat(content: Value) -> CompletionResponse {
        CompletionResponse::single(content.to_string(), FinishReason::Stop)
    }

    #[test]
    fn test_css_color_validation() {
        assert!(is_css_color("hotpink"));
        assert!(is_css_color("grey"));
        assert!(is_css_color("#ff00aa"));
        assert!(is_css_color("#fff"));
        assert!(is_css_color("rgb(255, 0, 0)"));
        assert!(!is_css_color("translucent"));
        assert!(!is_css_color("marbled"));
        assert!(!is_css_color("#ggg"));
    }

    #[test]
    fn test_missing_fields_become_null() {
        let b = batch(0, &[("1748265", "United Record Pressing, 180g, Gatefold")]);
        let record = normalize_record(&b, raw(json!({"id": "1748265"}))).unwrap();
        assert_eq!(
            record,
            EnrichmentRecord::empty("1748265", "United Record Pressing, 180g, Gatefold")
        );
    }

    #[test]
    fn test_empty_strings_and_placeholders_become_null() {
        let b = batch(0, &[("1", "180 g")]);
        let record = normalize_record(
            &b,
            raw(json!({
                "id": 1,
                "humanReadableColor": "",
                "cssReadableColors": [],
                "pattern": "  ",
                "texture": "None"
            })),
        )
        .unwrap();
        assert_eq!(record, EnrichmentRecord::empty("1", "180 g"));
    }

    #[test]
    fn test_marble_and_clear_never_colors() {
        let b = batch(0, &[("123", "Clear with Purple Marble")]);
        let record = normalize_record(
            &b,
            raw(json!({
                "id": 123,
                "humanReadableColor": "Clear with purple marble",
                "cssReadableColors": ["Clear", "Purple", "Marble", "marbled"],
                "pattern": "Marbled",
                "texture": null
            })),
        )
        .unwrap();
        assert_eq!(record.css_readable_colors, Some(vec!["purple".to_string()]));
        assert_eq!(record.pattern.as_deref(), Some("marbled"));
        assert_eq!(record.texture.as_deref(), Some("clear"));
        assert_eq!(
            record.human_readable_color.as_deref(),
            Some("Clear with purple marble")
        );
    }

    #[test]
    fn test_clear_does_not_override_texture() {
        let b = batch(0, &[("1", "Clear translucent")]);
        let record = normalize_record(
            &b,
            raw(json!({"id": "1", "cssReadableColors": ["clear"], "texture": "Translucent"})),
        )
        .unwrap();
        assert!(record.css_readable_colors.is_none());
        assert_eq!(record.texture.as_deref(), Some("translucent"));
    }

    #[test]
    fn test_colors_lowercased_collapsed_and_deduplicated() {
        let b = batch(0, &[("134", "Hot pink and red")]);
        let record = normalize_record(
            &b,
            raw(json!({
                "id": "134",
                "cssReadableColors": ["Hot Pink", "RED", "red", "translucent", "#FF0000"]
            })),
        )
        .unwrap();
        assert_eq!(
            record.css_readable_colors,
            Some(vec![
                "hotpink".to_string(),
                "red".to_string(),
                "#ff0000".to_string()
            ])
        );
    }

    #[test]
    fn test_colors_as_comma_separated_string() {
        let b = batch(0, &[("1", "Black/Silver")]);
        let record =
            normalize_record(&b, raw(json!({"id": "1", "cssReadableColors": "black, silver"})))
                .unwrap();
        assert_eq!(
            record.css_readable_colors,
            Some(vec!["black".to_string(), "silver".to_string()])
        );
    }

    #[test]
    fn test_description_is_original_input() {
        let b = batch(0, &[("456", "Black/Silver Swirl and Silver/red swirl")]);
        let record = normalize_record(
            &b,
            raw(json!({"id": "456", "description": "Black & Silver Swirl"})),
        )
        .unwrap();
        assert_eq!(record.description, "Black/Silver Swirl and Silver/red swirl");
    }

    #[test]
    fn test_legacy_pattern_texture_fills_texture() {
        let b = batch(0, &[("2113642", "Clear")]);
        let record = normalize_record(
            &b,
            raw(json!({
                "id": "2113642",
                "human_readable_color": "",
                "css_readable_colors": [],
                "pattern_texture": "Translucent"
            })),
        )
        .unwrap();
        assert_eq!(record.texture.as_deref(), Some("translucent"));
        assert!(record.pattern.is_none());
        assert!(record.human_readable_color.is_none());
    }

    #[test]
    fn test_unknown_and_missing_ids_rejected() {
        let b = batch(3, &[("1", "Red")]);
        assert_eq!(
            normalize_record(&b, raw(json!({"id": "2"}))),
            Err(ParseError::UnknownId {
                batch: 3,
                id: "2".to_string()
            })
        );
        assert!(matches!(
            normalize_record(&b, raw(json!({"pattern": "swirl"}))),
            Err(ParseError::MissingId { batch: 3, .. })
        ));
    }

    #[test]
    fn test_normalize_flattens_batches_and_drops_bad_items() {
        let first = batch(0, &[("112", "Purple and orange sunburst"), ("123", "Purple Marbled Translucent, 180 Gram")]);
        let second = batch(1, &[("156", "Marbled green vinyl")]);
        let responses = vec![
            (
                first,
                chat(json!({"records": [
                    {"id": 112, "humanReadableColor": "Purple and orange sunburst", "cssReadableColors": ["purple", "orange"], "pattern": "sunburst", "texture": null},
                    {"id": 999},
                    {"id": 123, "humanReadableColor": "Purple marbled translucent", "cssReadableColors": ["purple"], "pattern": "marbled", "texture": "translucent"}
                ]})),
            ),
            (
                second,
                chat(json!({"records": [
                    {"id": 156, "humanReadableColor": "Marbled green", "cssReadableColors": ["green", "marbled"], "pattern": "marbled", "texture": null}
                ]})),
            ),
        ];

        let records = normalize(&RecordsEnvelopeAdapter, &responses);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["112", "123", "156"]);
        assert_eq!(records[2].css_readable_colors, Some(vec!["green".to_string()]));
        assert_eq!(records[1].texture.as_deref(), Some("translucent"));
    }

    #[test]
    fn test_normalize_survives_unparseable_batch() {
        let responses = vec![
            (batch(0, &[("1", "Red")]), CompletionResponse::single("oops", FinishReason::MaxTokens)),
            (batch(1, &[("2", "Blue")]), chat(json!({"records": [{"id": "2", "cssReadableColors": ["blue"]}]}))),
        ];
        let records = normalize(&RecordsEnvelopeAdapter, &responses);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "2");
    }

    #[test]
    fn test_normalize_per_choice_responses() {
        let b = batch(0, &[("1597466", "Pink"), ("1684889", "Grey Marbled")]);
        let response = CompletionResponse {
            choices: vec![
                Choice {
                    index: 0,
                    content: json!({"human_readable_color": "Pink", "css_readable_colors": ["pink"], "pattern_texture": ""}).to_string(),
                    finish_reason: FinishReason::Stop,
                },
                Choice {
                    index: 1,
                    content: json!({"id": "1684889", "human_readable_color": "Grey", "css_readable_colors": ["grey"], "pattern_texture": "Marbled"}).to_string(),
                    finish_reason: FinishReason::Stop,
                },
            ],
            usage: None,
        };

        let records = normalize(&PerChoiceAdapter, &[(b, response)]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "1597466");
        assert_eq!(records[0].css_readable_colors, Some(vec!["pink".to_string()]));
        assert!(records[0].texture.is_none());
        assert_eq!(records[1].texture.as_deref(), Some("marbled"));
    }

    #[test]
    fn test_normalize_keeps_first_answer_per_id() {
        let responses = vec![
            (
                batch(0, &[("1", "Red"), ("2", "Blue")]),
                chat(json!({"records": [
                    {"id": "1", "cssReadableColors": ["red"]},
                    {"id": 1, "cssReadableColors": ["green"]},
                    {"id": "2", "cssReadableColors": ["blue"]}
                ]})),
            ),
            (
                batch(1, &[("3", "Pink")]),
                chat(json!({"records": [{"id": "3", "cssReadableColors": ["pink"]}]})),
            ),
        ];

        let records = normalize(&RecordsEnvelopeAdapter, &responses);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(records[0].css_readable_colors, Some(vec!["red".to_string()]));
    }

    #[test]
    fn test_normalize_accepts_both_casings_in_one_record() {
        let responses = vec![(
            batch(0, &[("1", "Red")]),
            chat(json!({"records": [{
                "id": "1",
                "humanReadableColor": "Red",
                "human_readable_color": "Red",
                "cssReadableColors": ["red"]
            }]})),
        )];

        let records = normalize(&RecordsEnvelopeAdapter, &responses);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].human_readable_color.as_deref(), Some("Red"));
        assert_eq!(records[0].css_readable_colors, Some(vec!["red".to_string()]));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let responses = vec![(
            batch(0, &[("1", "Blue Translucent"), ("2", "Clear")]),
            chat(json!({"records": [
                {"id": "1", "humanReadableColor": "Blue Translucent", "cssReadableColors": ["Blue"], "texture": "translucent"},
                {"id": 2, "cssReadableColors": ["clear"]}
            ]})),
        )];
        let first = serde_json::to_string(&normalize(&RecordsEnvelopeAdapter, &responses)).unwrap();
        let second = serde_json::to_string(&normalize(&RecordsEnvelopeAdapter, &responses)).unwrap();
        assert_eq!(first, second);
    }
}
