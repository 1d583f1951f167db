//! Toxicity and profanity entities
//!
//! Option enums parse case-insensitively so configuration values such as
//! `TOX_MODE=Sentence` and request bodies such as `"mode": "TEXT"` both work.

use std::{collections::BTreeMap, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Toxicity categories scored by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum ToxicityLabel {
    Toxicity,
    SevereToxicity,
    Obscene,
    Threat,
    Insult,
    IdentityAttack,
    SexualExplicit,
}

impl ToxicityLabel {
    /// Returns all labels in their canonical order
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Toxicity,
            Self::SevereToxicity,
            Self::Obscene,
            Self::Threat,
            Self::Insult,
            Self::IdentityAttack,
            Self::SexualExplicit,
        ]
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Toxicity => "toxicity",
            Self::SevereToxicity => "severe_toxicity",
            Self::Obscene => "obscene",
            Self::Threat => "threat",
            Self::Insult => "insult",
            Self::IdentityAttack => "identity_attack",
            Self::SexualExplicit => "sexual_explicit",
        }
    }
}

impl std::fmt::Display for ToxicityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToxicityLabel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|label| label.as_str() == wanted)
            .ok_or_else(|| DomainError::invalid_option("toxicity label", s))
    }
}

impl TryFrom<String> for ToxicityLabel {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Maximum score per label across all scored units
pub type LabelScores = BTreeMap<ToxicityLabel, f64>;

/// Granularity at which text is scored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum ScoringMode {
    /// Score and act on each sentence independently
    #[default]
    Sentence,
    /// Score the whole text as one unit
    Text,
}

impl ScoringMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sentence => "sentence",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sentence" => Ok(Self::Sentence),
            "text" => Ok(Self::Text),
            _ => Err(DomainError::invalid_option("scoring mode", s)),
        }
    }
}

impl TryFrom<String> for ScoringMode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// What happens to text that breaches the toxicity threshold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum ToxicAction {
    /// Drop offending sentences and keep the rest
    #[default]
    RemoveSentences,
    /// Drop the whole text
    RemoveAll,
    /// Replace each offending range with `[TOXIC]`
    Redact,
}

impl ToxicAction {
    /// Token substituted for redacted ranges
    pub const REDACTION_TOKEN: &'static str = "[TOXIC]";

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RemoveSentences => "remove_sentences",
            Self::RemoveAll => "remove_all",
            Self::Redact => "redact",
        }
    }

    /// Reason reported when this action was applied
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::RemoveSentences => "Toxic sentences removed.",
            Self::RemoveAll => "Toxic content removed (entire text).",
            Self::Redact => "Toxic sentences redacted.",
        }
    }
}

impl std::fmt::Display for ToxicAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToxicAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "remove_sentences" => Ok(Self::RemoveSentences),
            "remove_all" => Ok(Self::RemoveAll),
            "redact" => Ok(Self::Redact),
            _ => Err(DomainError::invalid_option("toxicity action", s)),
        }
    }
}

impl TryFrom<String> for ToxicAction {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// What happens to profane words
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum ProfanityAction {
    /// Replace each letter with `*`
    #[default]
    Mask,
    /// Delete the word
    Remove,
}

impl ProfanityAction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mask => "mask",
            Self::Remove => "remove",
        }
    }

    /// Reason reported for `count` hits
    #[must_use]
    pub fn reason(&self, count: usize) -> String {
        match self {
            Self::Mask => format!("{count} profanities masked."),
            Self::Remove => format!("{count} profanities removed."),
        }
    }
}

impl std::fmt::Display for ProfanityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfanityAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mask" => Ok(Self::Mask),
            "remove" => Ok(Self::Remove),
            _ => Err(DomainError::invalid_option("profanity action", s)),
        }
    }
}

impl TryFrom<String> for ProfanityAction {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Kind of flagged finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    Toxicity,
    Profanity,
    Policy,
}

/// A finding reported alongside the cleaned text. Spans count characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flagged {
    #[serde(rename = "type")]
    pub kind: FlagKind,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<[usize; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

impl Flagged {
    /// A toxic sentence (or whole text) over `[start, end)`
    #[must_use]
    pub fn toxicity(score: f64, start: usize, end: usize, sentence: impl Into<String>) -> Self {
        Self {
            kind: FlagKind::Toxicity,
            score,
            span: Some([start, end]),
            sentence: Some(sentence.into()),
            token: None,
            categories: None,
        }
    }

    /// A profane token over `[start, end)`
    #[must_use]
    pub fn profanity(token: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            kind: FlagKind::Profanity,
            score: 1.0,
            span: Some([start, end]),
            sentence: None,
            token: Some(token.into()),
            categories: None,
        }
    }

    /// A policy violation in the listed categories
    #[must_use]
    pub fn policy(categories: Vec<String>) -> Self {
        Self {
            kind: FlagKind::Policy,
            score: 1.0,
            span: None,
            sentence: None,
            token: None,
            categories: Some(categories),
        }
    }
}
