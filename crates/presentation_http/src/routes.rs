//! Route definitions and middleware stack

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{MethodRouter, get, post},
};
use infrastructure::AppConfig;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{
    handlers,
    middleware::{ApiKeyAuthLayer, RequestIdLayer, build_cors_layer, track_requests},
    state::{AppState, Guard},
};

/// Create the router for the validator held in `state`
pub fn create_router(state: AppState) -> Router {
    let validate: MethodRouter<AppState> = match &state.guard {
        Guard::Pii(service) => {
            post(handlers::validate::validate_pii).with_state(state.validator(service))
        },
        Guard::Toxicity(service) => {
            post(handlers::validate::validate_toxicity).with_state(state.validator(service))
        },
        Guard::Policy(service) => {
            post(handlers::validate::validate_policy).with_state(state.validator(service))
        },
    };

    Router::new()
        // Probes
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        // Metrics
        .route("/metrics", get(handlers::metrics::get_metrics))
        .route(
            "/metrics/prometheus",
            get(handlers::metrics::get_metrics_prometheus),
        )
        .route("/validate", validate)
        .with_state(state)
}

/// Router with the full middleware stack
///
/// Outermost first: metrics, request id, tracing, CORS, API key gate,
/// body limit.
pub fn build_app(state: AppState, config: &AppConfig) -> Router {
    let metrics = Arc::clone(&state.metrics);
    let body_limit = config.server.max_body_size_json_bytes;

    create_router(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(ApiKeyAuthLayer::new(config.security.api_keys.clone()))
        .layer(build_cors_layer(&config.server))
        .layer(TraceLayer::new_for_http())
        .layer(RequestIdLayer::new())
        .layer(middleware::from_fn_with_state(metrics, track_requests))
}
