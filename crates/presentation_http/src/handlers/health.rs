//! Health check handlers

use application::ComponentStatus;
use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Liveness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
}

/// Liveness check - is the server running?
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        service: state.service().name().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub service: String,
    pub components: Vec<ComponentStatus>,
}

/// Readiness check - are the detection backends loaded?
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let readiness = state.guard.readiness();
    let status = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            ready: readiness.ready,
            service: state.service().name().to_string(),
            components: readiness.components,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_round_trips() {
        let json = r#"{"ok":true,"service":"pii-service","version":"0.3.0"}"#;
        let resp: HealthResponse = serde_json::from_str(json).unwrap();
        assert!(resp.ok);
        assert_eq!(resp.service, "pii-service");
        assert_eq!(serde_json::to_string(&resp).unwrap(), json);
    }

    #[test]
    fn readiness_response_lists_components() {
        let resp = ReadinessResponse {
            ready: false,
            service: "tox-service".to_string(),
            components: vec![ComponentStatus::new("toxicity", "lexicon-original", false)],
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["ready"], false);
        assert_eq!(value["components"][0]["backend"], "lexicon-original");
    }
}
