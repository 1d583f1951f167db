//! HTTP middleware components
//!
//! Authentication, CORS, request correlation, metrics and body validation.

pub mod auth;
pub mod cors;
pub mod metrics;
pub mod request_id;
pub mod validation;

pub use auth::{API_KEY_HEADER, ApiKeyAuth, ApiKeyAuthLayer, ApiKeyStore};
pub use cors::build_cors_layer;
pub use metrics::track_requests;
pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdLayer};
pub use validation::{ValidatedJson, ValidationError};
