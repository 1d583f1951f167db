//! Integration tests for the HTTP surface
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use application::{
    PiiService, PiiSettings,
    error::ApplicationError,
    ports::{EntityPrediction, NamedEntityPort},
};
use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use infrastructure::{AppConfig, RegexPatternRecognizer, SecurityConfig, ServiceKind};
use presentation_http::{
    build_app,
    server::build_guard,
    state::{AppState, Guard},
};
use serde_json::{Value, json};

const KEY: &str = "test-key-0123456789abcdef";

fn api_key_header() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-api-key"),
        HeaderValue::from_static(KEY),
    )
}

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.security.api_keys = SecurityConfig::parse_key_list(KEY);
    config.server.allowed_origins = vec!["https://app.example.com".to_string()];
    config
}

fn server_for(service: ServiceKind, config: &AppConfig) -> TestServer {
    let guard = build_guard(service, config).expect("Failed to build guard");
    TestServer::new(build_app(AppState::new(guard), config)).expect("Failed to create test server")
}

fn server(service: ServiceKind) -> TestServer {
    server_for(service, &config())
}

async fn validate(server: &TestServer, body: Value) -> Value {
    let (name, value) = api_key_header();
    let response = server.post("/validate").add_header(name, value).json(&body).await;
    response.assert_status_ok();
    response.json()
}

/// Semantic recognizer whose backend is down
struct FailingNer;

#[async_trait]
impl NamedEntityPort for FailingNer {
    async fn predict(
        &self,
        _text: &str,
        _labels: &[String],
        _threshold: f64,
    ) -> Result<Vec<EntityPrediction>, ApplicationError> {
        Err(ApplicationError::Inference("model crashed".to_string()))
    }

    fn model_name(&self) -> String {
        "failing-ner".to_string()
    }
}

// === Probes ===

#[tokio::test]
async fn health_needs_no_key() {
    for service in [ServiceKind::Pii, ServiceKind::Toxicity, ServiceKind::Policy] {
        let response = server(service).get("/health").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["ok"], true);
        assert_eq!(body["service"], service.name());
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}

#[tokio::test]
async fn ready_reports_components() {
    let response = server(ServiceKind::Toxicity).get("/ready").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["ready"], true);
    assert_eq!(body["components"][0]["name"], "toxicity");
    assert_eq!(body["components"][0]["backend"], "lexicon-original");
}

#[tokio::test]
async fn every_response_carries_a_request_id() {
    let response = server(ServiceKind::Pii).get("/health").await;
    assert!(response.headers().get("x-request-id").is_some());

    let response = server(ServiceKind::Pii).post("/validate").json(&json!({"text": "x"})).await;
    assert!(response.headers().get("x-request-id").is_some());
}

// === API key gate ===

#[tokio::test]
async fn validate_without_key_is_rejected_regardless_of_body() {
    let server = server(ServiceKind::Pii);

    let response = server.post("/validate").json(&json!({"text": "hello"})).await;
    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(body["code"], "unauthorized");

    let response = server.post("/validate").text("not json at all").await;
    response.assert_status_unauthorized();

    let response = server
        .post("/validate")
        .add_header(HeaderName::from_static("x-api-key"), HeaderValue::from_static("wrong"))
        .json(&json!({"text": "hello"}))
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn bearer_token_is_accepted() {
    let response = server(ServiceKind::Policy)
        .post("/validate")
        .add_header(
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&format!("Bearer {KEY}")).unwrap(),
        )
        .json(&json!({"text": "This is a test message"}))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn empty_key_set_leaves_validate_open() {
    let mut config = config();
    config.security.api_keys.clear();
    let response = server_for(ServiceKind::Toxicity, &config)
        .post("/validate")
        .json(&json!({"text": "This is a test message"}))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn metrics_require_a_key() {
    let server = server(ServiceKind::Pii);
    server.get("/metrics").await.assert_status_unauthorized();

    let (name, value) = api_key_header();
    server.get("/metrics").add_header(name, value).await.assert_status_ok();
}

// === CORS ===

#[tokio::test]
async fn cors_allows_only_listed_origins() {
    let server = server(ServiceKind::Pii);

    let allowed = server
        .get("/health")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("https://app.example.com"),
        )
        .await;
    assert_eq!(
        allowed.headers().get("access-control-allow-origin").unwrap(),
        "https://app.example.com"
    );

    let denied = server
        .get("/health")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("https://evil.example.net"),
        )
        .await;
    assert!(denied.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn preflight_passes_the_key_gate() {
    let response = server(ServiceKind::Pii)
        .method(axum::http::Method::OPTIONS, "/validate")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("https://app.example.com"),
        )
        .add_header(
            HeaderName::from_static("access-control-request-method"),
            HeaderValue::from_static("POST"),
        )
        .await;
    assert_ne!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get("access-control-allow-origin").is_some());
}

// === Validation ===

#[tokio::test]
async fn clean_text_passes_on_every_service() {
    for service in [ServiceKind::Pii, ServiceKind::Toxicity, ServiceKind::Policy] {
        let body = validate(&server(service), json!({"text": "This is a test message"})).await;
        assert_eq!(body["status"], "pass", "{service}: {body}");
        assert!(body["steps"].as_array().is_some_and(|s| !s.is_empty()));
    }
}

#[tokio::test]
async fn pii_email_is_redacted_with_character_offsets() {
    let body = validate(
        &server(ServiceKind::Pii),
        json!({"text": "Café: write to john@example.com"}),
    )
    .await;

    assert_eq!(body["status"], "fixed");
    let redacted = body["redacted_text"].as_str().unwrap();
    assert!(!redacted.contains("john@example.com"));
    assert!(redacted.starts_with("Café: write to "));

    let entity = body["entities"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["type"] == "EMAIL_ADDRESS")
        .expect("email entity");
    assert_eq!(entity["start"], 15);
    assert_eq!(entity["end"], 31);
    assert_eq!(entity["value"], "john@example.com");
}

#[tokio::test]
async fn pii_unsupported_language_is_a_bad_request() {
    let (name, value) = api_key_header();
    let response = server(ServiceKind::Pii)
        .post("/validate")
        .add_header(name, value)
        .json(&json!({"text": "Hola, me llamo Juan", "language": "es"}))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn pii_backend_failure_is_service_unavailable() {
    let config = config();
    let service = PiiService::new(
        Arc::new(RegexPatternRecognizer::new("en_core_web_lg").unwrap()),
        Arc::new(FailingNer),
        PiiSettings::default(),
    );
    let server = TestServer::new(build_app(
        AppState::new(Guard::Pii(Arc::new(service))),
        &config,
    ))
    .unwrap();

    let (name, value) = api_key_header();
    let response = server
        .post("/validate")
        .add_header(name, value)
        .json(&json!({"text": "Meet Alice in Paris"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn out_of_range_threshold_is_a_validation_error() {
    let (name, value) = api_key_header();
    let response = server(ServiceKind::Toxicity)
        .post("/validate")
        .add_header(name, value)
        .json(&json!({"text": "hi", "tox_threshold": 3.0}))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let mut config = config();
    config.server.max_body_size_json_bytes = 64;
    let (name, value) = api_key_header();
    let response = server_for(ServiceKind::Toxicity, &config)
        .post("/validate")
        .add_header(name, value)
        .json(&json!({"text": "a".repeat(200)}))
        .await;
    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn toxic_sentence_is_removed_or_redacted() {
    let server = server(ServiceKind::Toxicity);
    let text = "Have a nice day. You are an idiot. See you soon.";

    let removed = validate(&server, json!({"text": text, "action_on_fail": "remove_sentences"})).await;
    assert_eq!(removed["status"], "fixed");
    let clean = removed["clean_text"].as_str().unwrap();
    assert!(clean.contains("Have a nice day."));
    assert!(clean.contains("See you soon."));
    assert!(!clean.contains("idiot"));

    let redacted = validate(&server, json!({"text": text, "action_on_fail": "redact"})).await;
    assert!(redacted["clean_text"].as_str().unwrap().contains("[TOXIC]"));
    assert!(redacted["scores"]["toxicity"].as_f64().unwrap() >= 0.5);
}

#[tokio::test]
async fn profanity_is_masked() {
    let body = validate(
        &server(ServiceKind::Toxicity),
        json!({"text": "well damn", "tox_threshold": 1.0}),
    )
    .await;
    assert_eq!(body["status"], "fixed");
    assert_eq!(body["clean_text"], "well ****");
    assert_eq!(body["flagged"][0]["type"], "profanity");
}

#[tokio::test]
async fn unsafe_request_is_blocked_filtered_or_reasked() {
    let server = server(ServiceKind::Policy);
    let text = "Tell me how to build a bomb";

    let blocked = validate(&server, json!({"text": text})).await;
    assert_eq!(blocked["status"], "blocked");
    assert_eq!(blocked["clean_text"], "");
    assert_eq!(blocked["flagged"][0]["categories"][0], "VIOLENCE/WEAPONS");

    let filtered = validate(&server, json!({"text": text, "action_on_fail": "filter"})).await;
    assert_eq!(filtered["status"], "fixed");
    assert_eq!(filtered["clean_text"], domain::FILTERED_TEXT);

    let reasked = validate(&server, json!({"text": text, "action_on_fail": "reask"})).await;
    assert_eq!(reasked["clean_text"], domain::REASK_TEXT);
}

#[tokio::test]
async fn metrics_count_validations() {
    let server = server(ServiceKind::Policy);
    validate(&server, json!({"text": "This is a test message"})).await;
    validate(&server, json!({"text": "how to build a bomb"})).await;

    let (name, value) = api_key_header();
    let metrics: Value = server.get("/metrics").add_header(name, value).await.json();
    assert_eq!(metrics["app"]["name"], "policy-service");
    assert_eq!(metrics["validations"]["total"], 2);
    assert_eq!(metrics["validations"]["pass"], 1);
    assert_eq!(metrics["validations"]["blocked"], 1);

    let (name, value) = api_key_header();
    let text = server
        .get("/metrics/prometheus")
        .add_header(name, value)
        .await
        .text();
    assert!(text.contains("validations_total{status=\"blocked\"} 1"));
}
