//! Request validation
//!
//! Provides a `ValidatedJson` extractor that validates request bodies using the validator crate.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::error::{ApiError, ErrorResponse};

/// Validation error type
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] JsonRejection),
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        let message = match self {
            Self::JsonError(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return ApiError::PayloadTooLarge.into_response();
            },
            Self::JsonError(e) => e.body_text(),
            Self::ValidationFailed(msg) => msg,
        };

        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(message, "validation_error")),
        )
            .into_response()
    }
}

/// A JSON extractor that also validates the request body
///
/// ```ignore
/// async fn handler(ValidatedJson(req): ValidatedJson<PiiValidateRequest>) {
///     // req is validated
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidationError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value
            .validate()
            .map_err(|e| ValidationError::ValidationFailed(describe(&e)))?;
        Ok(Self(value))
    }
}

/// `field: message` pairs, sorted by field name
fn describe(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                let message = error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), ToString::to_string);
                format!("{field}: {message}")
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body, routing::post};
    use serde::Deserialize;
    use tower::ServiceExt;

    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct TestRequest {
        text: String,
        #[validate(range(min = 0.0, max = 1.0, message = "must be between 0 and 1"))]
        threshold: Option<f64>,
    }

    async fn test_handler(ValidatedJson(req): ValidatedJson<TestRequest>) -> String {
        req.text
    }

    async fn call(body: &str) -> (StatusCode, serde_json::Value) {
        let response = Router::new()
            .route("/test", post(test_handler))
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/test")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn valid_request_passes() {
        let (status, _) = call(r#"{"text": "hello", "threshold": 0.5}"#).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn out_of_range_value_is_a_validation_error() {
        let (status, body) = call(r#"{"text": "hello", "threshold": 1.5}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
        assert_eq!(body["error"], "threshold: must be between 0 and 1");
    }

    #[tokio::test]
    async fn missing_field_and_bad_json_are_bad_requests() {
        let (status, body) = call(r#"{"threshold": 0.5}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");

        let (status, _) = call(r#"{"text": not json}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
