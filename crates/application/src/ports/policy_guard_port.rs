//! Policy guard port - safety classification against a written policy

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Input handed to a policy guard
///
/// `prompt` is the fully rendered guard prompt for generative models;
/// `content` is the bare text it wraps, for guards that match on it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardPrompt {
    pub prompt: String,
    pub content: String,
}

/// Port for a guard model that classifies text against a safety policy.
///
/// Implementations return the model's raw output, whose first line is
/// `SAFE` or `UNSAFE: <category, ...>`; parsing happens in the service.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PolicyGuardPort: Send + Sync {
    async fn classify(&self, input: &GuardPrompt) -> Result<String, ApplicationError>;

    /// Identifier of the loaded model or rule set
    fn model_name(&self) -> String;
}
