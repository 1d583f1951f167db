//! `POST /validate` handlers and request bodies

use std::{collections::HashMap, time::Instant};

use application::{
    PiiReport, PiiRequest, PiiService, PolicyReport, PolicyRequest, PolicyService,
    ToxicityReport, ToxicityRequest, ToxicityService,
};
use axum::{Json, extract::State};
use domain::{PolicyAction, ProfanityAction, ScoringMode, ToxicAction, ToxicityLabel};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::{error::ApiError, middleware::ValidatedJson, state::ValidatorState};

const MAX_LIST_LEN: u64 = 64;

fn thresholds_in_range(thresholds: &HashMap<String, f64>) -> Result<(), ValidationError> {
    if thresholds.values().all(|v| (0.0..=1.0).contains(v)) {
        Ok(())
    } else {
        Err(ValidationError::new("range").with_message("thresholds must be between 0 and 1".into()))
    }
}

/// Body of a PII validation request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PiiValidateRequest {
    pub text: String,
    #[validate(length(max = MAX_LIST_LEN))]
    pub entities: Option<Vec<String>>,
    #[validate(length(max = MAX_LIST_LEN))]
    pub gliner_labels: Option<Vec<String>>,
    #[validate(range(min = 0.0, max = 1.0, message = "must be between 0 and 1"))]
    pub gliner_threshold: Option<f64>,
    #[validate(custom(function = "thresholds_in_range"))]
    pub thresholds: Option<HashMap<String, f64>>,
    pub return_spans: Option<bool>,
    #[validate(length(min = 1, max = 16))]
    pub language: Option<String>,
}

impl From<PiiValidateRequest> for PiiRequest {
    fn from(body: PiiValidateRequest) -> Self {
        Self {
            text: body.text,
            entities: body.entities,
            semantic_labels: body.gliner_labels,
            semantic_threshold: body.gliner_threshold,
            thresholds: body.thresholds,
            return_spans: body.return_spans,
            language: body.language,
        }
    }
}

/// Body of a toxicity validation request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ToxicityValidateRequest {
    pub text: String,
    pub mode: Option<ScoringMode>,
    #[validate(range(min = 0.0, max = 1.0, message = "must be between 0 and 1"))]
    pub tox_threshold: Option<f64>,
    #[validate(length(max = MAX_LIST_LEN))]
    pub labels: Option<Vec<ToxicityLabel>>,
    pub action_on_fail: Option<ToxicAction>,
    pub profanity_enabled: Option<bool>,
    pub profanity_action: Option<ProfanityAction>,
    pub return_spans: Option<bool>,
}

impl From<ToxicityValidateRequest> for ToxicityRequest {
    fn from(body: ToxicityValidateRequest) -> Self {
        Self {
            text: body.text,
            mode: body.mode,
            threshold: body.tox_threshold,
            labels: body.labels,
            action: body.action_on_fail,
            profanity_enabled: body.profanity_enabled,
            profanity_action: body.profanity_action,
            return_spans: body.return_spans,
        }
    }
}

/// Body of a policy validation request
///
/// `return_spans` is accepted for parity with the other services; policy
/// results carry no spans.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PolicyValidateRequest {
    pub text: String,
    pub action_on_fail: Option<PolicyAction>,
    pub return_spans: Option<bool>,
}

impl From<PolicyValidateRequest> for PolicyRequest {
    fn from(body: PolicyValidateRequest) -> Self {
        Self {
            text: body.text,
            action: body.action_on_fail,
        }
    }
}

fn elapsed_us(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX)
}

/// `POST /validate` on the PII service
pub async fn validate_pii(
    State(state): State<ValidatorState<PiiService>>,
    ValidatedJson(body): ValidatedJson<PiiValidateRequest>,
) -> Result<Json<PiiReport>, ApiError> {
    let started = Instant::now();
    let result = state.service.validate(body.into()).await;
    state
        .metrics
        .record_validation(result.as_ref().ok().map(|r| r.status), elapsed_us(started));
    Ok(Json(result?))
}

/// `POST /validate` on the toxicity service
pub async fn validate_toxicity(
    State(state): State<ValidatorState<ToxicityService>>,
    ValidatedJson(body): ValidatedJson<ToxicityValidateRequest>,
) -> Result<Json<ToxicityReport>, ApiError> {
    let started = Instant::now();
    let result = state.service.validate(body.into()).await;
    state
        .metrics
        .record_validation(result.as_ref().ok().map(|r| r.status), elapsed_us(started));
    Ok(Json(result?))
}

/// `POST /validate` on the policy service
///
/// Guard failures are part of the report, so this never fails once the
/// body is accepted.
pub async fn validate_policy(
    State(state): State<ValidatorState<PolicyService>>,
    ValidatedJson(body): ValidatedJson<PolicyValidateRequest>,
) -> Json<PolicyReport> {
    let started = Instant::now();
    let report = state.service.validate(body.into()).await;
    state
        .metrics
        .record_validation(Some(report.status), elapsed_us(started));
    Json(report)
}
