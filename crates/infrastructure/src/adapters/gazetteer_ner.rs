//! Gazetteer named-entity adapter
//!
//! Recognizes people, places and organizations by looking up known names
//! (one gazetteer per label) and by a few surface cues: honorifics, self
//! introductions and company suffixes.
//!
//! Gazetteers are read from `<model_dir>/<label>.txt`, one name per line,
//! `#` starting a comment. Without a model directory the bundled lists are
//! used, unless the adapter runs offline, in which case startup fails.

use std::{
    fs,
    path::{Path, PathBuf},
};

use aho_corasick::{AhoCorasick, MatchKind};
use application::{
    error::ApplicationError,
    ports::{EntityPrediction, NamedEntityPort},
};
use async_trait::async_trait;
use domain::entity_type_for_label;
use regex::Regex;
use tracing::{debug, info, instrument, warn};

/// Score for a gazetteer hit written with a leading capital
const PROPER_NOUN_SCORE: f64 = 0.9;
/// Score for a lowercase gazetteer hit ("rose", "amazon")
const LOWERCASE_SCORE: f64 = 0.3;
const HONORIFIC_SCORE: f64 = 0.85;
const INTRODUCTION_SCORE: f64 = 0.8;
const COMPANY_SUFFIX_SCORE: f64 = 0.75;

const HONORIFIC_PATTERN: &str =
    r"\b(?:Mr|Mrs|Ms|Mx|Dr|Prof|Sir|Madam)\.?\s+([A-Z][a-z]+(?:[ \-][A-Z][a-z]+)?)";
const INTRODUCTION_PATTERN: &str =
    r"\b(?i:my name is|my name's|call me|i am called)\s+([A-Z][a-z]+(?: [A-Z][a-z]+)?)";
const COMPANY_SUFFIX_PATTERN: &str = r"\b(?:[A-Z][A-Za-z&\-]+ ){1,3}(?:Inc|Ltd|LLC|LLP|Corp|Corporation|GmbH|AG|PLC|Company|Bank|University)\b\.?";

const BUILTIN_PERSON: &[&str] = &[
    "Ahmed", "Aisha", "Alice", "Anna", "Bob", "Carlos", "Chen", "David", "Elena", "Emma",
    "Fatima", "Hiroshi", "James", "Jane", "John", "Laura", "Linda", "Maria", "Mark", "Michael",
    "Mohammed", "Olga", "Paul", "Peter", "Priya", "Raj", "Robert", "Rose", "Sarah", "Sofia",
    "Thomas", "Wei", "William", "Yuki",
];

const BUILTIN_LOCATION: &[&str] = &[
    "Amsterdam", "Australia", "Bangalore", "Beijing", "Berlin", "Boston", "Brazil",
    "California", "Canada", "Chicago", "China", "Delhi", "Dublin", "France", "Germany",
    "India", "Italy", "Japan", "London", "Los Angeles", "Madrid", "Mexico", "Mumbai",
    "New York", "Paris", "Rome", "San Francisco", "Seattle", "Shanghai", "Singapore",
    "Spain", "Sydney", "Texas", "Tokyo", "Toronto", "United Kingdom", "United States",
];

const BUILTIN_ORGANIZATION: &[&str] = &[
    "Amazon", "Apple", "Google", "IBM", "Infosys", "Intel", "Meta", "Microsoft", "Netflix",
    "OpenAI", "Red Cross", "Samsung", "Tata Consultancy Services", "Tesla", "United Nations",
    "Wipro", "World Health Organization",
];

/// Settings for [`GazetteerNerAdapter::load`]
#[derive(Debug, Clone)]
pub struct GazetteerConfig {
    /// Reported model identifier
    pub model_name: String,
    /// Directory with `<label>.txt` files
    pub model_dir: Option<PathBuf>,
    /// Labels to load
    pub labels: Vec<String>,
    /// Fail instead of using the bundled lists when `model_dir` is unusable
    pub offline: bool,
}

struct Gazetteer {
    label: String,
    matcher: AhoCorasick,
}

/// Named-entity recognizer over word lists and surface cues
pub struct GazetteerNerAdapter {
    model_name: String,
    source: String,
    gazetteers: Vec<Gazetteer>,
    honorific: Regex,
    introduction: Regex,
    company_suffix: Regex,
}

impl std::fmt::Debug for GazetteerNerAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GazetteerNerAdapter")
            .field("model_name", &self.model_name)
            .field("source", &self.source)
            .field(
                "labels",
                &self.gazetteers.iter().map(|g| g.label.as_str()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl GazetteerNerAdapter {
    /// Load gazetteers for `config.labels`
    pub fn load(config: &GazetteerConfig) -> Result<Self, ApplicationError> {
        let model_dir = config.model_dir.as_deref().filter(|dir| dir.is_dir());

        let (source, gazetteers) = match model_dir {
            Some(dir) => {
                let gazetteers = config
                    .labels
                    .iter()
                    .map(|label| load_label_file(dir, label))
                    .collect::<Result<Vec<_>, _>>()?
                    .into_iter()
                    .flatten()
                    .collect();
                (dir.display().to_string(), gazetteers)
            },
            None if config.offline => {
                return Err(ApplicationError::Configuration(format!(
                    "Offline mode is enabled but the model directory {} is not usable. \
                     Point GLINER_LOCAL_DIR at a directory of <label>.txt gazetteers.",
                    config
                        .model_dir
                        .as_ref()
                        .map_or_else(|| "(unset)".to_string(), |d| d.display().to_string())
                )));
            },
            None => {
                if let Some(dir) = &config.model_dir {
                    warn!(dir = %dir.display(), "Model directory not found, using built-in gazetteers");
                }
                let gazetteers = config
                    .labels
                    .iter()
                    .filter_map(|label| {
                        builtin_terms(label).map(|terms| build_gazetteer(label, terms))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                ("built-in".to_string(), gazetteers)
            },
        };

        info!(
            model = %config.model_name,
            source = %source,
            labels = gazetteers.len(),
            "Named-entity gazetteers loaded"
        );

        Ok(Self {
            model_name: config.model_name.clone(),
            source,
            gazetteers,
            honorific: compile(HONORIFIC_PATTERN)?,
            introduction: compile(INTRODUCTION_PATTERN)?,
            company_suffix: compile(COMPANY_SUFFIX_PATTERN)?,
        })
    }

    /// Synchronous core of [`NamedEntityPort::predict`]
    pub fn detect(&self, text: &str, labels: &[String], threshold: f64) -> Vec<EntityPrediction> {
        let mut predictions = Vec::new();
        for label in labels {
            if let Some(gazetteer) = self
                .gazetteers
                .iter()
                .find(|g| g.label.eq_ignore_ascii_case(label))
            {
                predictions.extend(gazetteer_hits(gazetteer, text, label));
            }
            match entity_type_for_label(label).as_str() {
                "PERSON" => {
                    predictions.extend(capture_hits(&self.honorific, text, label, HONORIFIC_SCORE));
                    predictions.extend(capture_hits(
                        &self.introduction,
                        text,
                        label,
                        INTRODUCTION_SCORE,
                    ));
                },
                "ORGANIZATION" => {
                    predictions.extend(
                        self.company_suffix
                            .find_iter(text)
                            .map(|m| EntityPrediction::new(label.as_str(), m.start(), m.end(), COMPANY_SUFFIX_SCORE)),
                    );
                },
                _ => {},
            }
        }
        predictions.retain(|p| p.score >= threshold);
        predictions.sort_by(|a, b| (a.start, a.end).cmp(&(b.start, b.end)));
        predictions.dedup_by(|later, earlier| {
            later.start == earlier.start && later.end == earlier.end && later.label == earlier.label
        });
        predictions
    }
}

#[async_trait]
impl NamedEntityPort for GazetteerNerAdapter {
    #[instrument(skip(self, text, labels), fields(text_len = text.len()))]
    async fn predict(
        &self,
        text: &str,
        labels: &[String],
        threshold: f64,
    ) -> Result<Vec<EntityPrediction>, ApplicationError> {
        let predictions = self.detect(text, labels, threshold);
        debug!(count = predictions.len(), "Named entities predicted");
        Ok(predictions)
    }

    fn model_name(&self) -> String {
        format!("{} (gazetteer: {})", self.model_name, self.source)
    }
}

fn compile(pattern: &str) -> Result<Regex, ApplicationError> {
    Regex::new(pattern)
        .map_err(|e| ApplicationError::Configuration(format!("Invalid entity pattern: {e}")))
}

fn builtin_terms(label: &str) -> Option<Vec<String>> {
    let terms = match label.to_lowercase().as_str() {
        "person" => BUILTIN_PERSON,
        "location" => BUILTIN_LOCATION,
        "organization" => BUILTIN_ORGANIZATION,
        _ => return None,
    };
    Some(terms.iter().map(ToString::to_string).collect())
}

/// Read `<dir>/<label>.txt`. A missing file leaves the label without a
/// gazetteer; an unreadable one is an error.
fn load_label_file(dir: &Path, label: &str) -> Result<Option<Gazetteer>, ApplicationError> {
    let path = dir.join(format!("{label}.txt"));
    if !path.is_file() {
        warn!(path = %path.display(), "No gazetteer for label");
        return Ok(None);
    }
    let contents = fs::read_to_string(&path).map_err(|e| {
        ApplicationError::Configuration(format!("Failed to read {}: {e}", path.display()))
    })?;
    let terms: Vec<String> = contents
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    build_gazetteer(label, terms).map(Some)
}

fn build_gazetteer(label: &str, terms: Vec<String>) -> Result<Gazetteer, ApplicationError> {
    let matcher = AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .match_kind(MatchKind::LeftmostLongest)
        .build(&terms)
        .map_err(|e| {
            ApplicationError::Configuration(format!("Failed to build gazetteer '{label}': {e}"))
        })?;
    Ok(Gazetteer {
        label: label.to_string(),
        matcher,
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whole-word gazetteer matches. A capitalised person match swallows a
/// directly following capitalised word as the surname.
fn gazetteer_hits(gazetteer: &Gazetteer, text: &str, label: &str) -> Vec<EntityPrediction> {
    let is_person = entity_type_for_label(label) == "PERSON";
    gazetteer
        .matcher
        .find_iter(text)
        .filter(|m| {
            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();
            !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
        })
        .map(|m| {
            let proper = text[m.start()..]
                .chars()
                .next()
                .is_some_and(char::is_uppercase);
            let score = if proper { PROPER_NOUN_SCORE } else { LOWERCASE_SCORE };
            let end = if is_person && proper {
                surname_end(text, m.end())
            } else {
                m.end()
            };
            EntityPrediction::new(label, m.start(), end, score)
        })
        .collect()
}

fn surname_end(text: &str, end: usize) -> usize {
    let rest = &text[end..];
    let Some(word) = rest.strip_prefix(' ') else {
        return end;
    };
    let len: usize = word
        .char_indices()
        .take_while(|(i, c)| if *i == 0 { c.is_uppercase() } else { c.is_lowercase() })
        .map(|(_, c)| c.len_utf8())
        .sum();
    if len >= 2 { end + 1 + len } else { end }
}

fn capture_hits(regex: &Regex, text: &str, label: &str, score: f64) -> Vec<EntityPrediction> {
    regex
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| EntityPrediction::new(label, m.start(), m.end(), score))
        .collect()
}
