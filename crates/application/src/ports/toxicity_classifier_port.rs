//! Toxicity classifier port

use async_trait::async_trait;
use domain::LabelScores;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for multi-label toxicity scoring
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ToxicityClassifierPort: Send + Sync {
    /// Score each text independently; returns one score map per input, in order
    async fn score(&self, texts: &[String]) -> Result<Vec<LabelScores>, ApplicationError>;

    /// Identifier of the loaded model
    fn model_name(&self) -> String;
}
