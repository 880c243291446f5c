//! Unit records shared by ingestion and query-time retrieval.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Title used when a stored unit carries no `title`.
pub const UNKNOWN_TITLE: &str = "Unknown Source";
/// Class number used when a stored unit carries no `class_num`.
pub const UNKNOWN_CLASS: &str = "Unknown";

/// A retrieved teaching fragment with its metadata resolved to text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Source lecture title.
    pub title: String,
    /// Lecture sequence number, rendered as text.
    pub class_num: String,
    /// The teaching passage itself.
    pub content: String,
}

impl Unit {
    /// Builds a unit from explicit fields.
    pub fn new(
        title: impl Into<String>,
        class_num: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            class_num: class_num.into(),
            content: content.into(),
        }
    }

    /// Resolves a vector-store payload into a unit.
    ///
    /// Missing or null fields fall back to [`UNKNOWN_TITLE`] / [`UNKNOWN_CLASS`];
    /// numeric class numbers are rendered in decimal. Points written by older
    /// ingestion runs stored the passage under `text`, which is read when
    /// `content` is absent.
    pub fn from_payload(payload: &Map<String, Value>) -> Self {
        let title = field_text(payload, "title").unwrap_or_else(|| UNKNOWN_TITLE.to_string());
        let class_num =
            field_text(payload, "class_num").unwrap_or_else(|| UNKNOWN_CLASS.to_string());
        let content = field_text(payload, "content")
            .or_else(|| field_text(payload, "text"))
            .unwrap_or_default();
        Self {
            title,
            class_num,
            content,
        }
    }

    /// Citation string for this unit, e.g. `Class 3 – Talk1`.
    pub fn reference(&self) -> String {
        format!("Class {} – {}", self.class_num, self.title)
    }

    /// Payload stored alongside the unit's vector.
    pub fn to_payload(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert("title".into(), Value::String(self.title.clone()));
        payload.insert("class_num".into(), Value::String(self.class_num.clone()));
        payload.insert("content".into(), Value::String(self.content.clone()));
        payload
    }
}

fn field_text(payload: &Map<String, Value>, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(num) => Some(num.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// A unit returned by a similarity search, with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredUnit {
    /// Resolved unit payload.
    pub unit: Unit,
    /// Similarity score reported by the store (higher is closer for cosine).
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("payload must be an object"),
        }
    }

    #[test]
    fn missing_fields_use_sentinels() {
        let unit = Unit::from_payload(&payload(json!({ "content": "body" })));
        assert_eq!(unit.title, UNKNOWN_TITLE);
        assert_eq!(unit.class_num, UNKNOWN_CLASS);
        assert_eq!(unit.reference(), "Class Unknown – Unknown Source");
    }

    #[test]
    fn null_fields_use_sentinels() {
        let unit = Unit::from_payload(&payload(json!({ "title": null, "class_num": null })));
        assert_eq!(unit.reference(), "Class Unknown – Unknown Source");
        assert_eq!(unit.content, "");
    }

    #[test]
    fn numeric_class_renders_as_digits() {
        let unit = Unit::from_payload(&payload(json!({
            "title": "Talk1",
            "class_num": 3,
            "content": "the seer is not seen"
        })));
        assert_eq!(unit.reference(), "Class 3 – Talk1");
    }

    #[test]
    fn legacy_text_key_is_read_as_content() {
        let unit = Unit::from_payload(&payload(json!({
            "title": "Talk2",
            "class_num": "4",
            "text": "legacy body"
        })));
        assert_eq!(unit.content, "legacy body");

        let both = Unit::from_payload(&payload(json!({ "content": "new", "text": "old" })));
        assert_eq!(both.content, "new");
    }

    #[test]
    fn payload_round_trips_through_resolution() {
        let unit = Unit::new("Talk1", "3", "passage");
        assert_eq!(Unit::from_payload(&unit.to_payload()), unit);
    }
}
