//! Application layer - Use cases and orchestration
//!
//! Contains the three validation use cases (PII, toxicity, policy) and the
//! port definitions for the text-analysis backends they delegate to.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
