//! HTTP presentation layer for the guardrail services
//!
//! One router serves whichever validator the process was started for:
//! `GET /health`, `GET /ready`, `POST /validate` and the metrics endpoints,
//! behind the API key gate, CORS and request-id middleware.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use middleware::{ApiKeyAuthLayer, ValidatedJson, ValidationError};
pub use routes::{build_app, create_router};
pub use state::{AppState, Guard};
