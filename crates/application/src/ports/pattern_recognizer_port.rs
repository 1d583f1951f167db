//! Pattern recognizer port - structured PII detection

use async_trait::async_trait;
use domain::DetectedSpan;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for rule-based recognizers of structured PII (emails, card numbers, IDs)
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PatternRecognizerPort: Send + Sync {
    /// Find candidate spans for the requested entity types.
    ///
    /// Candidates are returned unfiltered; the caller applies thresholds.
    /// Spans carry byte offsets and [`domain::EntitySource::Pattern`].
    async fn analyze(
        &self,
        text: &str,
        language: &str,
        entities: &[String],
    ) -> Result<Vec<DetectedSpan>, ApplicationError>;

    /// Language codes this recognizer can analyze
    fn supported_languages(&self) -> Vec<String>;

    /// Entity types this recognizer knows about
    fn supported_entities(&self) -> Vec<String>;
}
