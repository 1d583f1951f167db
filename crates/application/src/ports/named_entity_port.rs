//! Named entity port - semantic detection of people, places and organizations

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;

/// A labelled span predicted by a named-entity model, in byte offsets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityPrediction {
    pub label: String,
    pub start: usize,
    pub end: usize,
    pub score: f64,
}

impl EntityPrediction {
    #[must_use]
    pub fn new(label: impl Into<String>, start: usize, end: usize, score: f64) -> Self {
        Self {
            label: label.into(),
            start,
            end,
            score,
        }
    }
}

/// Port for semantic named-entity recognition
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NamedEntityPort: Send + Sync {
    /// Predict entities for the given free-form labels, keeping scores `>= threshold`
    async fn predict(
        &self,
        text: &str,
        labels: &[String],
        threshold: f64,
    ) -> Result<Vec<EntityPrediction>, ApplicationError>;

    /// Identifier of the loaded model
    fn model_name(&self) -> String;
}
