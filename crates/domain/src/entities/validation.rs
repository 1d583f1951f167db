//! Outcome types shared by every validator

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Overall verdict of a validation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// Nothing had to change
    Pass,
    /// The text was rewritten (redacted, masked, filtered)
    Fixed,
    /// The text was withheld entirely
    Blocked,
    /// The validator could not reach a verdict
    Error,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pass => "pass",
            Self::Fixed => "fixed",
            Self::Blocked => "blocked",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// One stage of the validation pipeline, reported for auditability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationStep {
    pub name: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ValidationStep {
    /// Step emitted when there was nothing to validate
    #[must_use]
    pub fn noop() -> Self {
        Self {
            name: "noop".to_string(),
            passed: true,
            details: None,
        }
    }

    /// A successful step with structured details
    #[must_use]
    pub fn passed(name: impl Into<String>, details: Value) -> Self {
        Self {
            name: name.into(),
            passed: true,
            details: Some(details),
        }
    }

    /// A failed step with structured details
    #[must_use]
    pub fn failed(name: impl Into<String>, details: Value) -> Self {
        Self {
            name: name.into(),
            passed: false,
            details: Some(details),
        }
    }
}
