//! API key authentication middleware
//!
//! Checks the `X-API-Key` header, or an `Authorization: Bearer` token when
//! that header is absent, against the keys configured for the service.
//! Each key is compared in constant time. Probe routes and CORS preflight
//! requests are not checked, and an empty key set disables the gate.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    extract::Request,
    http::{Method, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use tower::{Layer, Service};
use tracing::debug;

use crate::error::ApiError;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Routes reachable without a key
const PROBE_PATHS: &[&str] = &["/health", "/ready"];

/// The configured API keys
#[derive(Clone, Debug, Default)]
pub struct ApiKeyStore {
    keys: Vec<SecretString>,
}

impl ApiKeyStore {
    #[must_use]
    pub fn new(keys: Vec<SecretString>) -> Self {
        Self { keys }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Whether `candidate` equals one of the keys
    ///
    /// Every key is compared so the time taken does not depend on which key
    /// matched.
    #[must_use]
    pub fn verify(&self, candidate: &str) -> bool {
        let candidate = candidate.as_bytes();
        self.keys.iter().fold(false, |found, key| {
            let matches: bool = key.expose_secret().as_bytes().ct_eq(candidate).into();
            found | matches
        })
    }
}

/// Layer that applies API key authentication
#[derive(Clone, Debug)]
pub struct ApiKeyAuthLayer {
    store: Arc<ApiKeyStore>,
}

impl ApiKeyAuthLayer {
    #[must_use]
    pub fn new(keys: Vec<SecretString>) -> Self {
        Self {
            store: Arc::new(ApiKeyStore::new(keys)),
        }
    }

    /// Layer that lets every request through
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Vec::new())
    }
}

impl<S> Layer<S> for ApiKeyAuthLayer {
    type Service = ApiKeyAuth<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ApiKeyAuth {
            inner,
            store: Arc::clone(&self.store),
        }
    }
}

/// Middleware service for API key authentication
#[derive(Clone, Debug)]
pub struct ApiKeyAuth<S> {
    inner: S,
    store: Arc<ApiKeyStore>,
}

impl<S> Service<Request> for ApiKeyAuth<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let store = Arc::clone(&self.store);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if is_exempt(&req) || store.is_empty() {
                return inner.call(req).await;
            }

            let verified = presented_key(&req).map(|key| store.verify(key));
            match verified {
                Some(true) => inner.call(req).await,
                Some(false) => {
                    debug!(path = %req.uri().path(), "Rejected request with invalid API key");
                    Ok(unauthorized_response("Invalid API key"))
                },
                None => Ok(unauthorized_response("Missing API key")),
            }
        })
    }
}

fn is_exempt(req: &Request) -> bool {
    req.method() == Method::OPTIONS || PROBE_PATHS.contains(&req.uri().path())
}

fn presented_key(req: &Request) -> Option<&str> {
    let headers = req.headers();
    if let Some(value) = headers.get(API_KEY_HEADER) {
        return value.to_str().ok();
    }
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn unauthorized_response(message: &str) -> Response {
    ApiError::Unauthorized(message.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::StatusCode,
        routing::{get, post},
    };
    use tower::ServiceExt;

    use super::*;

    async fn ok_handler() -> &'static str {
        "ok"
    }

    fn keys(raw: &[&str]) -> Vec<SecretString> {
        raw.iter().map(|k| SecretString::from(k.to_string())).collect()
    }

    fn router(layer: ApiKeyAuthLayer) -> Router {
        Router::new()
            .route("/validate", post(ok_handler))
            .route("/health", get(ok_handler))
            .route("/ready", get(ok_handler))
            .layer(layer)
    }

    async fn status(app: Router, request: Request<Body>) -> StatusCode {
        app.oneshot(request).await.unwrap().status()
    }

    fn post_validate() -> axum::http::request::Builder {
        Request::builder().method("POST").uri("/validate")
    }

    #[tokio::test]
    async fn empty_key_set_disables_gate() {
        let app = router(ApiKeyAuthLayer::disabled());
        let request = post_validate().body(Body::empty()).unwrap();
        assert_eq!(status(app, request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn valid_header_key_passes() {
        let app = router(ApiKeyAuthLayer::new(keys(&["key-one", "key-two"])));
        let request = post_validate()
            .header(API_KEY_HEADER, "key-two")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status(app, request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn wrong_or_missing_key_is_rejected() {
        let app = router(ApiKeyAuthLayer::new(keys(&["key-one"])));

        let wrong = post_validate()
            .header(API_KEY_HEADER, "key-on")
            .body(Body::from(r#"{"text":"hi"}"#))
            .unwrap();
        assert_eq!(status(app.clone(), wrong).await, StatusCode::UNAUTHORIZED);

        let missing = post_validate().body(Body::empty()).unwrap();
        assert_eq!(status(app, missing).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bearer_token_is_accepted_as_fallback() {
        let app = router(ApiKeyAuthLayer::new(keys(&["key-one"])));

        let bearer = post_validate()
            .header(AUTHORIZATION, "Bearer key-one")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status(app.clone(), bearer).await, StatusCode::OK);

        let basic = post_validate()
            .header(AUTHORIZATION, "Basic a2V5LW9uZQ==")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status(app, basic).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn header_key_takes_precedence_over_bearer() {
        let app = router(ApiKeyAuthLayer::new(keys(&["key-one"])));
        let request = post_validate()
            .header(API_KEY_HEADER, "wrong")
            .header(AUTHORIZATION, "Bearer key-one")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status(app, request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn probes_and_preflight_are_exempt() {
        let app = router(ApiKeyAuthLayer::new(keys(&["key-one"])));
        for path in ["/health", "/ready"] {
            let request = Request::builder().uri(path).body(Body::empty()).unwrap();
            assert_eq!(status(app.clone(), request).await, StatusCode::OK, "{path}");
        }

        let preflight = Request::builder()
            .method("OPTIONS")
            .uri("/validate")
            .body(Body::empty())
            .unwrap();
        assert_ne!(status(app, preflight).await, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn store_rejects_prefixes_and_extensions() {
        let store = ApiKeyStore::new(keys(&["secret"]));
        assert!(store.verify("secret"));
        assert!(!store.verify("secre"));
        assert!(!store.verify("secret!"));
        assert!(!store.verify(""));
        assert!(!ApiKeyStore::default().verify("secret"));
    }
}
