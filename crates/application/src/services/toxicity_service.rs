//! Toxicity service - score, remove or redact toxic content and mask profanity

use std::{fmt, sync::Arc};

use domain::{
    Flagged, LabelScores, ProfanityAction, ScoringMode, ToxicAction, ToxicityLabel,
    ValidationStatus, ValidationStep,
    errors::check_threshold,
    text::{
        CharOffsets, TextRange, join_preserving_spacing, mask_ranges, redact_ranges,
        remove_ranges, sentences_with_offsets,
    },
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::{
    error::ApplicationError,
    ports::{ProfanityFilterPort, ToxicityClassifierPort},
    services::readiness::{ComponentStatus, Readiness},
};

/// Defaults applied when a request leaves an option unset
#[derive(Debug, Clone)]
pub struct ToxicitySettings {
    pub mode: ScoringMode,
    pub threshold: f64,
    /// Labels that count towards a breach; empty means all labels
    pub labels: Vec<ToxicityLabel>,
    pub action: ToxicAction,
    pub profanity_enabled: bool,
    pub profanity_action: ProfanityAction,
}

impl Default for ToxicitySettings {
    fn default() -> Self {
        Self {
            mode: ScoringMode::Sentence,
            threshold: 0.5,
            labels: Vec::new(),
            action: ToxicAction::RemoveSentences,
            profanity_enabled: true,
            profanity_action: ProfanityAction::Mask,
        }
    }
}

/// A toxicity validation request; unset options fall back to [`ToxicitySettings`]
#[derive(Debug, Clone, Default)]
pub struct ToxicityRequest {
    pub text: String,
    pub mode: Option<ScoringMode>,
    pub threshold: Option<f64>,
    pub labels: Option<Vec<ToxicityLabel>>,
    pub action: Option<ToxicAction>,
    pub profanity_enabled: Option<bool>,
    pub profanity_action: Option<ProfanityAction>,
    pub return_spans: Option<bool>,
}

impl ToxicityRequest {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Result of a toxicity validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToxicityReport {
    pub status: ValidationStatus,
    pub clean_text: String,
    pub flagged: Vec<Flagged>,
    pub scores: LabelScores,
    pub steps: Vec<ValidationStep>,
    pub reasons: Vec<String>,
}

/// A scored unit of text: the whole text or one sentence
struct Unit<'a> {
    range: TextRange,
    text: &'a str,
}

/// Service that removes toxic content and profanity from free text
pub struct ToxicityService {
    classifier: Arc<dyn ToxicityClassifierPort>,
    profanity: Arc<dyn ProfanityFilterPort>,
    settings: ToxicitySettings,
}

impl fmt::Debug for ToxicityService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToxicityService")
            .field("settings", &self.settings)
            .field("classifier", &self.classifier.model_name())
            .finish_non_exhaustive()
    }
}

impl ToxicityService {
    /// Create a new toxicity service
    pub fn new(
        classifier: Arc<dyn ToxicityClassifierPort>,
        profanity: Arc<dyn ProfanityFilterPort>,
        settings: ToxicitySettings,
    ) -> Self {
        Self {
            classifier,
            profanity,
            settings,
        }
    }

    pub const fn settings(&self) -> &ToxicitySettings {
        &self.settings
    }

    /// Score `request.text` and clean it according to the resolved actions
    #[instrument(skip(self, request), fields(text_len = request.text.len()))]
    pub async fn validate(
        &self,
        request: ToxicityRequest,
    ) -> Result<ToxicityReport, ApplicationError> {
        let text = request.text.as_str();
        if text.trim().is_empty() {
            return Ok(ToxicityReport {
                status: ValidationStatus::Pass,
                clean_text: text.to_string(),
                flagged: Vec::new(),
                scores: LabelScores::new(),
                steps: vec![ValidationStep::noop()],
                reasons: vec!["Empty text".to_string()],
            });
        }

        let mode = request.mode.unwrap_or(self.settings.mode);
        let threshold = match request.threshold {
            Some(value) => check_threshold("tox_threshold", value)?,
            None => self.settings.threshold,
        };
        let labels = self.resolve_labels(request.labels);
        let action = request.action.unwrap_or(self.settings.action);
        let profanity_enabled = request
            .profanity_enabled
            .unwrap_or(self.settings.profanity_enabled);
        let profanity_action = request
            .profanity_action
            .unwrap_or(self.settings.profanity_action);
        let return_spans = request.return_spans.unwrap_or(true);

        let units = split_units(text, mode);
        let inputs: Vec<String> = units.iter().map(|u| u.text.to_string()).collect();
        let unit_scores = self.classifier.score(&inputs).await?;
        if unit_scores.len() != units.len() {
            return Err(ApplicationError::Inference(format!(
                "classifier returned {} score sets for {} inputs",
                unit_scores.len(),
                units.len()
            )));
        }

        let offsets = CharOffsets::new(text);
        let mut scores: LabelScores = labels.iter().map(|label| (*label, 0.0)).collect();
        let mut flagged = Vec::new();
        let mut keep = Vec::new();
        let mut bad = Vec::new();

        for (unit, unit_score) in units.iter().zip(&unit_scores) {
            let mut unit_max = 0.0_f64;
            let mut breach = false;
            for label in &labels {
                let value = unit_score.get(label).copied().unwrap_or(0.0);
                let aggregate = scores.entry(*label).or_insert(0.0);
                *aggregate = aggregate.max(value);
                unit_max = unit_max.max(value);
                breach |= value >= threshold;
            }

            if breach {
                bad.push(unit.range);
                let mut flag = Flagged::toxicity(
                    unit_max,
                    offsets.char_index(unit.range.start),
                    offsets.char_index(unit.range.end),
                    unit.text,
                );
                if !return_spans {
                    flag.span = None;
                }
                flagged.push(flag);
            } else {
                keep.push(unit.range);
            }
        }

        let mut changed = !bad.is_empty();
        let mut clean_text = if bad.is_empty() {
            text.to_string()
        } else {
            match action {
                ToxicAction::RemoveAll => String::new(),
                ToxicAction::Redact => redact_ranges(text, &bad, ToxicAction::REDACTION_TOKEN),
                ToxicAction::RemoveSentences => join_preserving_spacing(text, &keep),
            }
        };

        let mut steps = vec![ValidationStep::passed(
            "toxicity",
            json!({
                "mode": mode.as_str(),
                "threshold": threshold,
                "labels": labels,
                "toxic_spans": bad.len(),
            }),
        )];

        let mut profanity_hits = 0;
        if profanity_enabled && !clean_text.is_empty() {
            let hits = self.profanity.find_profanity(&clean_text);
            if !hits.is_empty() {
                changed = true;
                profanity_hits = hits.len();
                let cleaned_offsets = CharOffsets::new(&clean_text);
                let ranges: Vec<TextRange> = hits
                    .iter()
                    .map(|hit| TextRange::new(hit.start, hit.end))
                    .collect();
                flagged.extend(hits.iter().map(|hit| {
                    let mut flag = Flagged::profanity(
                        hit.token.clone(),
                        cleaned_offsets.char_index(hit.start),
                        cleaned_offsets.char_index(hit.end),
                    );
                    if !return_spans {
                        flag.span = None;
                    }
                    flag
                }));
                clean_text = match profanity_action {
                    ProfanityAction::Mask => mask_ranges(&clean_text, &ranges, '*'),
                    ProfanityAction::Remove => remove_ranges(&clean_text, &ranges),
                };
            }
        }
        steps.push(ValidationStep::passed(
            "profanity",
            json!({ "hits": profanity_hits, "action": profanity_action.as_str() }),
        ));

        let mut reasons = Vec::new();
        if !bad.is_empty() {
            reasons.push(action.reason().to_string());
        }
        if profanity_hits > 0 {
            reasons.push(profanity_action.reason(profanity_hits));
        }
        if reasons.is_empty() {
            reasons.push("No toxicity or profanity detected".to_string());
        }

        let status = if changed {
            info!(
                toxic_spans = bad.len(),
                profanity_hits, "Toxic content cleaned"
            );
            ValidationStatus::Fixed
        } else {
            debug!("No toxicity or profanity detected");
            ValidationStatus::Pass
        };

        Ok(ToxicityReport {
            status,
            clean_text,
            flagged,
            scores,
            steps,
            reasons,
        })
    }

    /// Readiness of the classifier and profanity list
    pub fn readiness(&self) -> Readiness {
        let words = self.profanity.word_count();
        Readiness::from_components(vec![
            ComponentStatus::new("toxicity", self.classifier.model_name(), true),
            ComponentStatus::new("profanity", format!("{words} words"), words > 0),
        ])
    }

    fn resolve_labels(&self, requested: Option<Vec<ToxicityLabel>>) -> Vec<ToxicityLabel> {
        let labels = requested
            .filter(|l| !l.is_empty())
            .or_else(|| Some(self.settings.labels.clone()).filter(|l| !l.is_empty()))
            .unwrap_or_else(|| ToxicityLabel::all().to_vec());

        let mut unique = Vec::with_capacity(labels.len());
        for label in labels {
            if !unique.contains(&label) {
                unique.push(label);
            }
        }
        unique
    }
}

fn split_units(text: &str, mode: ScoringMode) -> Vec<Unit<'_>> {
    let whole = || Unit {
        range: TextRange::new(0, text.len()),
        text,
    };
    match mode {
        ScoringMode::Text => vec![whole()],
        ScoringMode::Sentence => {
            let sentences = sentences_with_offsets(text);
            if sentences.is_empty() {
                vec![whole()]
            } else {
                sentences
                    .into_iter()
                    .map(|s| Unit {
                        range: TextRange::new(s.start, s.end),
                        text: s.text,
                    })
                    .collect()
            }
        },
    }
}
