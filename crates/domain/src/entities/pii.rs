//! PII entities: detected spans, placeholders and the redacted output record

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Entity types scanned for when neither the request nor the configuration names any
pub const DEFAULT_ENTITIES: &[&str] = &[
    "EMAIL_ADDRESS",
    "PHONE_NUMBER",
    "CREDIT_CARD",
    "US_SSN",
    "US_PASSPORT",
    "IP_ADDRESS",
    "IBAN_CODE",
    "PERSON",
    "LOCATION",
    "ORGANIZATION",
    "IN_AADHAAR",
    "IN_PAN",
    "IN_PASSPORT",
];

/// Replacement used when no placeholder is configured for a type
pub const DEFAULT_PLACEHOLDER: &str = "[REDACTED]";

/// Threshold applied when no per-entity threshold is configured at all
pub const DEFAULT_GLOBAL_THRESHOLD: f64 = 0.30;

/// Which detector produced a span. Pattern matches win overlaps against semantic ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitySource {
    /// Structured pattern recognizer (regex + checksum validation)
    Pattern,
    /// Semantic named-entity recognizer
    Semantic,
}

/// A candidate PII span over the input, in byte offsets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedSpan {
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    pub score: f64,
    pub source: EntitySource,
}

impl DetectedSpan {
    #[must_use]
    pub fn new(
        entity_type: impl Into<String>,
        start: usize,
        end: usize,
        score: f64,
        source: EntitySource,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            start,
            end,
            score,
            source,
        }
    }

    /// Length of the span in bytes
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the two half-open spans share at least one position
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// Replacement tokens keyed by entity type, with an optional `DEFAULT` entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Placeholders(HashMap<String, String>);

impl Placeholders {
    /// Key consulted when a type has no dedicated placeholder
    pub const DEFAULT_KEY: &'static str = "DEFAULT";

    #[must_use]
    pub fn new(map: HashMap<String, String>) -> Self {
        Self(map)
    }

    /// Placeholder for a type, falling back to `DEFAULT` and then `[REDACTED]`
    #[must_use]
    pub fn for_type(&self, entity_type: &str) -> &str {
        self.0
            .get(entity_type)
            .or_else(|| self.0.get(Self::DEFAULT_KEY))
            .map_or(DEFAULT_PLACEHOLDER, String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, String>> for Placeholders {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

/// A redacted entity as reported to the caller; offsets count characters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactedEntity {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub value: String,
    pub start: usize,
    pub end: usize,
    pub score: f64,
    pub replacement: String,
}

impl RedactedEntity {
    /// Build the output record, rounding the score to six decimals
    #[must_use]
    pub fn new(
        entity_type: impl Into<String>,
        value: impl Into<String>,
        start: usize,
        end: usize,
        score: f64,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            value: value.into(),
            start,
            end,
            score: (score * 1_000_000.0).round() / 1_000_000.0,
            replacement: replacement.into(),
        }
    }
}

/// Semantic recognizer label for an entity type, if the type is semantic
#[must_use]
pub fn semantic_label_for(entity_type: &str) -> Option<&'static str> {
    match entity_type {
        "PERSON" => Some("person"),
        "LOCATION" => Some("location"),
        "ORGANIZATION" => Some("organization"),
        _ => None,
    }
}

/// Entity type for a semantic recognizer label
#[must_use]
pub fn entity_type_for_label(label: &str) -> String {
    let upper = label.to_uppercase();
    if upper.contains("PERSON") {
        "PERSON".to_string()
    } else if upper.contains("LOC") {
        "LOCATION".to_string()
    } else if upper.contains("ORG") {
        "ORGANIZATION".to_string()
    } else if upper.is_empty() {
        "PERSON".to_string()
    } else {
        upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn placeholder_lookup_falls_back() {
        let mut map = HashMap::new();
        map.insert("EMAIL_ADDRESS".to_string(), "<EMAIL>".to_string());
        let placeholders = Placeholders::new(map.clone());
        assert_eq!(placeholders.for_type("EMAIL_ADDRESS"), "<EMAIL>");
        assert_eq!(placeholders.for_type("PERSON"), "[REDACTED]");

        map.insert("DEFAULT".to_string(), "***".to_string());
        let placeholders = Placeholders::new(map);
        assert_eq!(placeholders.for_type("PERSON"), "***");
    }

    #[test]
    fn placeholders_deserialize_from_json_object() {
        let placeholders: Placeholders =
            serde_json::from_str(r#"{"PERSON":"<NAME>","DEFAULT":"<PII>"}"#).unwrap();
        assert_eq!(placeholders.for_type("PERSON"), "<NAME>");
        assert_eq!(placeholders.for_type("IBAN_CODE"), "<PII>");
    }

    #[test]
    fn redacted_entity_rounds_score_and_renames_type() {
        let entity = RedactedEntity::new("PERSON", "Ada", 0, 3, 0.123_456_789, "<NAME>");
        let value = serde_json::to_value(&entity).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "PERSON",
                "value": "Ada",
                "start": 0,
                "end": 3,
                "score": 0.123_457,
                "replacement": "<NAME>"
            })
        );
    }

    #[test]
    fn overlap_is_half_open() {
        let a = DetectedSpan::new("A", 0, 5, 1.0, EntitySource::Pattern);
        let b = DetectedSpan::new("B", 5, 8, 1.0, EntitySource::Pattern);
        let c = DetectedSpan::new("C", 4, 6, 1.0, EntitySource::Semantic);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn label_mapping_matches_substrings() {
        assert_eq!(entity_type_for_label("person"), "PERSON");
        assert_eq!(entity_type_for_label("geo location"), "LOCATION");
        assert_eq!(entity_type_for_label("organisation"), "ORGANIZATION");
        assert_eq!(entity_type_for_label("vehicle"), "VEHICLE");
        assert_eq!(semantic_label_for("LOCATION"), Some("location"));
        assert_eq!(semantic_label_for("EMAIL_ADDRESS"), None);
    }
}
