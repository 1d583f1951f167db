//! Readiness reporting for the loaded backends

use serde::{Deserialize, Serialize};

/// Status of one backend behind a validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentStatus {
    /// Role of the component in the pipeline (e.g. `pattern_recognizer`)
    pub name: String,
    /// Identifier of the loaded model or rule set
    pub backend: String,
    pub ready: bool,
}

impl ComponentStatus {
    #[must_use]
    pub fn new(name: impl Into<String>, backend: impl Into<String>, ready: bool) -> Self {
        Self {
            name: name.into(),
            backend: backend.into(),
            ready,
        }
    }
}

/// Aggregate readiness of a validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readiness {
    pub ready: bool,
    pub components: Vec<ComponentStatus>,
}

impl Readiness {
    /// Ready when every component is ready
    #[must_use]
    pub fn from_components(components: Vec<ComponentStatus>) -> Self {
        Self {
            ready: components.iter().all(|c| c.ready),
            components,
        }
    }
}
