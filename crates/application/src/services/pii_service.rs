//! PII service - detect and redact personally identifiable information
//!
//! Two detectors run over the text: a pattern recognizer for structured
//! identifiers and a semantic recognizer for people, places and organizations.
//! Their spans are thresholded, merged without overlap and replaced with the
//! configured placeholders.

use std::{collections::HashMap, fmt, sync::Arc};

use domain::{
    DEFAULT_ENTITIES, DEFAULT_GLOBAL_THRESHOLD, DetectedSpan, EntitySource, Placeholders,
    RedactedEntity, ValidationStatus, ValidationStep, entity_type_for_label,
    errors::check_threshold,
    semantic_label_for,
    text::{CharOffsets, apply_redactions, is_generic_preface_span, merge_spans},
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::ApplicationError,
    ports::{NamedEntityPort, PatternRecognizerPort},
    services::readiness::{ComponentStatus, Readiness},
};

/// Defaults applied when a request leaves an option unset
#[derive(Debug, Clone)]
pub struct PiiSettings {
    /// Analysis language
    pub language: String,
    /// Entity types to scan for; empty means the built-in list
    pub entities: Vec<String>,
    /// Minimum score per entity type
    pub entity_thresholds: HashMap<String, f64>,
    /// Replacement tokens per entity type
    pub placeholders: Placeholders,
    /// Minimum score for semantic predictions
    pub semantic_threshold: f64,
}

impl Default for PiiSettings {
    fn default() -> Self {
        let mut placeholders = HashMap::new();
        placeholders.insert(
            Placeholders::DEFAULT_KEY.to_string(),
            domain::DEFAULT_PLACEHOLDER.to_string(),
        );
        Self {
            language: "en".to_string(),
            entities: Vec::new(),
            entity_thresholds: HashMap::new(),
            placeholders: Placeholders::new(placeholders),
            semantic_threshold: 0.60,
        }
    }
}

/// A PII validation request; unset options fall back to [`PiiSettings`]
#[derive(Debug, Clone, Default)]
pub struct PiiRequest {
    pub text: String,
    pub entities: Option<Vec<String>>,
    pub semantic_labels: Option<Vec<String>>,
    pub semantic_threshold: Option<f64>,
    pub thresholds: Option<HashMap<String, f64>>,
    pub return_spans: Option<bool>,
    pub language: Option<String>,
}

impl PiiRequest {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Result of a PII validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PiiReport {
    pub status: ValidationStatus,
    pub redacted_text: String,
    pub entities: Vec<RedactedEntity>,
    pub steps: Vec<ValidationStep>,
    pub reasons: Vec<String>,
}

impl PiiReport {
    fn empty(text: &str) -> Self {
        Self {
            status: ValidationStatus::Pass,
            redacted_text: text.to_string(),
            entities: Vec::new(),
            steps: vec![ValidationStep::noop()],
            reasons: vec!["Empty text".to_string()],
        }
    }
}

/// Service that redacts PII from free text
pub struct PiiService {
    patterns: Arc<dyn PatternRecognizerPort>,
    entities: Arc<dyn NamedEntityPort>,
    settings: PiiSettings,
}

impl fmt::Debug for PiiService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PiiService")
            .field("settings", &self.settings)
            .field("ner_model", &self.entities.model_name())
            .finish_non_exhaustive()
    }
}

impl PiiService {
    /// Create a new PII service
    pub fn new(
        patterns: Arc<dyn PatternRecognizerPort>,
        entities: Arc<dyn NamedEntityPort>,
        settings: PiiSettings,
    ) -> Self {
        Self {
            patterns,
            entities,
            settings,
        }
    }

    pub const fn settings(&self) -> &PiiSettings {
        &self.settings
    }

    /// Detect and redact PII in `request.text`
    #[instrument(skip(self, request), fields(text_len = request.text.len()))]
    pub async fn validate(&self, request: PiiRequest) -> Result<PiiReport, ApplicationError> {
        let text = request.text.as_str();
        if text.trim().is_empty() {
            return Ok(PiiReport::empty(text));
        }

        let language = request
            .language
            .as_deref()
            .unwrap_or(&self.settings.language);
        if !self
            .patterns
            .supported_languages()
            .iter()
            .any(|l| l == language)
        {
            return Err(ApplicationError::InvalidOperation(format!(
                "Unsupported language: {language}"
            )));
        }

        let entities = self.resolve_entities(request.entities);
        let thresholds = self.resolve_thresholds(request.thresholds)?;
        let global_threshold = thresholds
            .values()
            .copied()
            .reduce(f64::min)
            .unwrap_or(DEFAULT_GLOBAL_THRESHOLD);

        let pattern_spans: Vec<DetectedSpan> = self
            .patterns
            .analyze(text, language, &entities)
            .await?
            .into_iter()
            .filter(|span| is_valid_span(text, span))
            .filter(|span| {
                let threshold = thresholds
                    .get(&span.entity_type)
                    .copied()
                    .unwrap_or(global_threshold);
                span.score >= threshold
            })
            .collect();

        let labels = request
            .semantic_labels
            .filter(|labels| !labels.is_empty())
            .unwrap_or_else(|| semantic_labels_for(&entities));
        let semantic_threshold = match request.semantic_threshold {
            Some(value) => check_threshold("gliner_threshold", value)?,
            None => self.settings.semantic_threshold,
        };
        let semantic_spans = if labels.is_empty() {
            Vec::new()
        } else {
            self.semantic_spans(text, &labels, semantic_threshold)
                .await?
        };

        let steps = vec![
            ValidationStep::passed(
                "pattern_recognizer",
                json!({ "count": pattern_spans.len() }),
            ),
            ValidationStep::passed(
                "semantic_ner",
                json!({ "count": semantic_spans.len(), "labels": labels }),
            ),
        ];

        let mut candidates = pattern_spans;
        candidates.extend(semantic_spans);
        let merged = merge_spans(candidates);

        if merged.is_empty() {
            debug!("No PII detected");
            return Ok(PiiReport {
                status: ValidationStatus::Pass,
                redacted_text: text.to_string(),
                entities: Vec::new(),
                steps,
                reasons: vec!["No PII detected".to_string()],
            });
        }

        let redacted_text = apply_redactions(text, &merged, &self.settings.placeholders);
        info!(redactions = merged.len(), "PII redacted");

        let entities = if request.return_spans.unwrap_or(true) {
            self.to_output(text, &merged)
        } else {
            Vec::new()
        };

        Ok(PiiReport {
            status: ValidationStatus::Fixed,
            redacted_text,
            entities,
            steps,
            reasons: vec!["PII redacted".to_string()],
        })
    }

    /// Readiness of the pattern and semantic recognizers
    pub fn readiness(&self) -> Readiness {
        let pattern_entities = self.patterns.supported_entities();
        Readiness::from_components(vec![
            ComponentStatus::new(
                "pattern_recognizer",
                format!("{} entity types", pattern_entities.len()),
                !pattern_entities.is_empty(),
            ),
            ComponentStatus::new("semantic_ner", self.entities.model_name(), true),
        ])
    }

    fn resolve_entities(&self, requested: Option<Vec<String>>) -> Vec<String> {
        if let Some(entities) = requested.filter(|e| !e.is_empty()) {
            return entities;
        }
        if !self.settings.entities.is_empty() {
            return self.settings.entities.clone();
        }
        DEFAULT_ENTITIES.iter().map(ToString::to_string).collect()
    }

    fn resolve_thresholds(
        &self,
        requested: Option<HashMap<String, f64>>,
    ) -> Result<HashMap<String, f64>, ApplicationError> {
        let mut thresholds = self.settings.entity_thresholds.clone();
        for (entity_type, value) in requested.unwrap_or_default() {
            check_threshold(&entity_type, value)?;
            thresholds.insert(entity_type, value);
        }
        Ok(thresholds)
    }

    async fn semantic_spans(
        &self,
        text: &str,
        labels: &[String],
        threshold: f64,
    ) -> Result<Vec<DetectedSpan>, ApplicationError> {
        let predictions = self.entities.predict(text, labels, threshold).await?;

        Ok(predictions
            .into_iter()
            .filter_map(|prediction| {
                let Some(raw) = text.get(prediction.start..prediction.end) else {
                    warn!(
                        start = prediction.start,
                        end = prediction.end,
                        "Discarding prediction with invalid offsets"
                    );
                    return None;
                };
                if is_generic_preface_span(raw) {
                    return None;
                }
                let entity_type = entity_type_for_label(&prediction.label);
                let is_name = matches!(entity_type.as_str(), "PERSON" | "ORGANIZATION");
                if is_name && raw.trim().chars().count() < 2 {
                    return None;
                }
                Some(DetectedSpan::new(
                    entity_type,
                    prediction.start,
                    prediction.end,
                    prediction.score,
                    EntitySource::Semantic,
                ))
            })
            .collect())
    }

    fn to_output(&self, text: &str, spans: &[DetectedSpan]) -> Vec<RedactedEntity> {
        let offsets = CharOffsets::new(text);
        spans
            .iter()
            .map(|span| {
                RedactedEntity::new(
                    span.entity_type.clone(),
                    text.get(span.start..span.end).unwrap_or_default(),
                    offsets.char_index(span.start),
                    offsets.char_index(span.end),
                    span.score,
                    self.settings.placeholders.for_type(&span.entity_type),
                )
            })
            .collect()
    }
}

fn is_valid_span(text: &str, span: &DetectedSpan) -> bool {
    let valid = span.start < span.end && text.get(span.start..span.end).is_some();
    if !valid {
        warn!(
            entity_type = %span.entity_type,
            start = span.start,
            end = span.end,
            "Discarding span with invalid offsets"
        );
    }
    valid
}

/// Semantic labels for the semantic entity types among `entities`, deduplicated
fn semantic_labels_for(entities: &[String]) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for label in entities.iter().filter_map(|e| semantic_label_for(e)) {
        if !labels.iter().any(|l| l == label) {
            labels.push(label.to_string());
        }
    }
    labels
}
