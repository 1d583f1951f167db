//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A text-analysis backend failed to produce a result
    #[error("Inference error: {0}")]
    Inference(String),

    /// The request asks for something the loaded backends cannot do
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Whether the failure is caused by the caller's input
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Domain(_) | Self::InvalidOperation(_))
    }
}
