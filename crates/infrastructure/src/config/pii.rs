//! PII redaction configuration.

use std::{collections::HashMap, path::PathBuf};

use application::services::PiiSettings;
use domain::{DEFAULT_PLACEHOLDER, Placeholders};
use serde::{Deserialize, Serialize};

use crate::adapters::GazetteerConfig;

/// Defaults for the PII service and settings for its recognizers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiiConfig {
    /// Analysis language for the pattern recognizer
    #[serde(default = "default_language")]
    pub language: String,

    /// Name of the linguistic model backing the pattern recognizer
    /// (reported on `/ready`)
    #[serde(default = "default_language_model")]
    pub language_model: String,

    /// Entity types scanned when a request names none; empty = built-in list
    #[serde(default)]
    pub entities: Vec<String>,

    /// Minimum score per entity type
    #[serde(default)]
    pub entity_thresholds: HashMap<String, f64>,

    /// Replacement token per entity type, with `DEFAULT` as the fallback
    #[serde(default = "default_placeholders")]
    pub placeholders: HashMap<String, String>,

    /// Identifier of the semantic recognizer model
    #[serde(default = "default_semantic_model")]
    pub semantic_model: String,

    /// Directory holding the semantic model's `<label>.txt` gazetteers
    #[serde(default)]
    pub semantic_model_dir: Option<PathBuf>,

    /// Labels the semantic recognizer loads
    #[serde(default = "default_semantic_labels")]
    pub semantic_labels: Vec<String>,

    /// Minimum score for semantic predictions
    #[serde(default = "default_semantic_threshold")]
    pub semantic_threshold: f64,

    /// Refuse to fall back to the bundled gazetteer when the model
    /// directory is unusable
    #[serde(default)]
    pub offline: bool,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_language_model() -> String {
    "en_core_web_lg".to_string()
}

fn default_placeholders() -> HashMap<String, String> {
    HashMap::from([(
        Placeholders::DEFAULT_KEY.to_string(),
        DEFAULT_PLACEHOLDER.to_string(),
    )])
}

fn default_semantic_model() -> String {
    "urchade/gliner_small-v2.1".to_string()
}

fn default_semantic_labels() -> Vec<String> {
    vec![
        "person".to_string(),
        "location".to_string(),
        "organization".to_string(),
    ]
}

const fn default_semantic_threshold() -> f64 {
    0.60
}

impl Default for PiiConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            language_model: default_language_model(),
            entities: Vec::new(),
            entity_thresholds: HashMap::new(),
            placeholders: default_placeholders(),
            semantic_model: default_semantic_model(),
            semantic_model_dir: None,
            semantic_labels: default_semantic_labels(),
            semantic_threshold: default_semantic_threshold(),
            offline: false,
        }
    }
}

impl PiiConfig {
    /// Request defaults handed to [`application::services::PiiService`]
    #[must_use]
    pub fn to_settings(&self) -> PiiSettings {
        PiiSettings {
            language: self.language.clone(),
            entities: self.entities.clone(),
            entity_thresholds: self.entity_thresholds.clone(),
            placeholders: Placeholders::new(self.placeholders.clone()),
            semantic_threshold: self.semantic_threshold,
        }
    }

    /// Loader settings for [`crate::adapters::GazetteerNerAdapter`]
    #[must_use]
    pub fn gazetteer_config(&self) -> GazetteerConfig {
        GazetteerConfig {
            model_name: self.semantic_model.clone(),
            model_dir: self.semantic_model_dir.clone(),
            labels: self.semantic_labels.clone(),
            offline: self.offline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_defaults() {
        let settings = PiiConfig::default().to_settings();
        let service_defaults = PiiSettings::default();
        assert_eq!(settings.language, service_defaults.language);
        assert_eq!(
            settings.placeholders.for_type("EMAIL_ADDRESS"),
            service_defaults.placeholders.for_type("EMAIL_ADDRESS")
        );
        assert!((settings.semantic_threshold - service_defaults.semantic_threshold).abs() < f64::EPSILON);
    }

    #[test]
    fn settings_carry_thresholds_and_placeholders() {
        let config = PiiConfig {
            entity_thresholds: HashMap::from([("PERSON".to_string(), 0.8)]),
            placeholders: HashMap::from([("PERSON".to_string(), "<NAME>".to_string())]),
            ..PiiConfig::default()
        };
        let settings = config.to_settings();
        assert_eq!(settings.entity_thresholds["PERSON"], 0.8);
        assert_eq!(settings.placeholders.for_type("PERSON"), "<NAME>");
        assert_eq!(settings.placeholders.for_type("EMAIL_ADDRESS"), DEFAULT_PLACEHOLDER);
    }

    #[test]
    fn gazetteer_config_follows_semantic_settings() {
        let config = PiiConfig {
            semantic_model_dir: Some(PathBuf::from("models/gliner")),
            semantic_labels: vec!["person".to_string()],
            offline: true,
            ..PiiConfig::default()
        };
        let gazetteer = config.gazetteer_config();
        assert_eq!(gazetteer.model_name, "urchade/gliner_small-v2.1");
        assert_eq!(gazetteer.model_dir, Some(PathBuf::from("models/gliner")));
        assert_eq!(gazetteer.labels, ["person"]);
        assert!(gazetteer.offline);
    }
}
