//! Toxicity and profanity configuration.

use std::fmt;

use application::services::ToxicitySettings;
use domain::{ProfanityAction, ScoringMode, ToxicAction, ToxicityLabel};
use serde::{Deserialize, Serialize};

use super::default_true;

/// Lexicon weighting used by the toxicity classifier
///
/// Unrecognised names fall back to [`ToxicityModelFamily::Original`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ToxicityModelFamily {
    #[default]
    Original,
    /// Down-weights identity terms that commonly appear in benign text
    Unbiased,
    /// Adds non-English vocabulary
    Multilingual,
}

impl ToxicityModelFamily {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Unbiased => "unbiased",
            Self::Multilingual => "multilingual",
        }
    }
}

impl From<String> for ToxicityModelFamily {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<&str> for ToxicityModelFamily {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "unbiased" => Self::Unbiased,
            "multilingual" => Self::Multilingual,
            _ => Self::Original,
        }
    }
}

impl fmt::Display for ToxicityModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Defaults for the toxicity service and settings for its backends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToxicityConfig {
    #[serde(default)]
    pub model: ToxicityModelFamily,

    #[serde(default)]
    pub mode: ScoringMode,

    /// Score at or above which a label counts as a breach
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Labels that count towards a breach; empty = all
    #[serde(default)]
    pub labels: Vec<ToxicityLabel>,

    #[serde(default)]
    pub action: ToxicAction,

    #[serde(default = "default_true")]
    pub profanity_enabled: bool,

    #[serde(default)]
    pub profanity_action: ProfanityAction,

    /// Words added to the built-in profanity list
    #[serde(default)]
    pub profanity_extra_words: Vec<String>,
}

const fn default_threshold() -> f64 {
    0.5
}

impl Default for ToxicityConfig {
    fn default() -> Self {
        Self {
            model: ToxicityModelFamily::default(),
            mode: ScoringMode::default(),
            threshold: default_threshold(),
            labels: Vec::new(),
            action: ToxicAction::default(),
            profanity_enabled: true,
            profanity_action: ProfanityAction::default(),
            profanity_extra_words: Vec::new(),
        }
    }
}

impl ToxicityConfig {
    /// Request defaults handed to [`application::services::ToxicityService`]
    #[must_use]
    pub fn to_settings(&self) -> ToxicitySettings {
        ToxicitySettings {
            mode: self.mode,
            threshold: self.threshold,
            labels: self.labels.clone(),
            action: self.action,
            profanity_enabled: self.profanity_enabled,
            profanity_action: self.profanity_action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_family_falls_back_to_original() {
        assert_eq!(ToxicityModelFamily::from("Unbiased"), ToxicityModelFamily::Unbiased);
        assert_eq!(
            ToxicityModelFamily::from(" MULTILINGUAL "),
            ToxicityModelFamily::Multilingual
        );
        assert_eq!(ToxicityModelFamily::from("roberta"), ToxicityModelFamily::Original);
        assert_eq!(ToxicityModelFamily::from(""), ToxicityModelFamily::Original);
    }

    #[test]
    fn model_family_deserializes_leniently() {
        let family: ToxicityModelFamily = serde_json::from_str("\"something-else\"").unwrap();
        assert_eq!(family, ToxicityModelFamily::Original);
    }

    #[test]
    fn settings_mirror_config() {
        let config = ToxicityConfig {
            mode: ScoringMode::Text,
            threshold: 0.8,
            labels: vec![ToxicityLabel::Insult],
            action: ToxicAction::Redact,
            profanity_enabled: false,
            profanity_action: ProfanityAction::Remove,
            ..ToxicityConfig::default()
        };
        let settings = config.to_settings();
        assert_eq!(settings.mode, ScoringMode::Text);
        assert_eq!(settings.labels, [ToxicityLabel::Insult]);
        assert_eq!(settings.action, ToxicAction::Redact);
        assert!(!settings.profanity_enabled);
        assert_eq!(settings.profanity_action, ProfanityAction::Remove);
    }
}
