//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// A named option received a value outside its vocabulary
    #[error("Invalid {kind}: {value}")]
    InvalidOption { kind: &'static str, value: String },

    /// A score threshold outside the closed unit interval
    #[error("{name} must be between 0.0 and 1.0, got {value}")]
    ThresholdOutOfRange { name: String, value: f64 },

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl DomainError {
    /// Create an invalid option error
    pub fn invalid_option(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidOption {
            kind,
            value: value.into(),
        }
    }
}

/// Checks that a threshold lies in `[0.0, 1.0]` and returns it unchanged
pub fn check_threshold(name: &str, value: f64) -> Result<f64, DomainError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(DomainError::ThresholdOutOfRange {
            name: name.to_string(),
            value,
        })
    }
}
