//! CORS policy from the configured origin allow-list

use axum::http::{HeaderValue, Method};
use infrastructure::ServerConfig;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

const ALLOWED_METHODS: [Method; 3] = [Method::GET, Method::POST, Method::OPTIONS];

/// Build the CORS layer for `config.allowed_origins`
///
/// An empty list or `*` allows any origin. Origins that are not valid header
/// values are skipped with a warning.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(Any);

    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            },
        })
        .collect();
    layer.allow_origin(origins)
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
        routing::post,
    };
    use tower::ServiceExt;

    use super::*;

    fn app(origins: &[&str]) -> Router {
        let config = ServerConfig {
            allowed_origins: origins.iter().map(ToString::to_string).collect(),
            ..ServerConfig::default()
        };
        Router::new()
            .route("/validate", post(|| async { "ok" }))
            .layer(build_cors_layer(&config))
    }

    async fn allow_origin(app: Router, origin: &str) -> Option<String> {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/validate")
                    .header(header::ORIGIN, origin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn listed_origin_is_allowed() {
        let app = app(&["https://app.example.com/", "https://admin.example.com"]);
        assert_eq!(
            allow_origin(app, "https://app.example.com").await.as_deref(),
            Some("https://app.example.com")
        );
    }

    #[tokio::test]
    async fn unlisted_origin_gets_no_header() {
        let app = app(&["https://app.example.com"]);
        assert!(allow_origin(app, "https://evil.example.net").await.is_none());
    }

    #[tokio::test]
    async fn wildcard_and_empty_allow_any_origin() {
        assert_eq!(allow_origin(app(&["*"]), "https://x.test").await.as_deref(), Some("*"));
        assert_eq!(allow_origin(app(&[]), "https://x.test").await.as_deref(), Some("*"));
    }

    #[tokio::test]
    async fn preflight_lists_methods() {
        let response = app(&["https://app.example.com"])
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/validate")
                    .header(header::ORIGIN, "https://app.example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let methods = response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
            .to_str()
            .unwrap()
            .to_string();
        assert!(methods.contains("POST"));
    }
}
