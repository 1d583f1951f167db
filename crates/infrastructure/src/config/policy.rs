//! Policy guard configuration.

use std::path::PathBuf;

use application::services::{POLICY_SUMMARY, PolicySettings};
use domain::PolicyAction;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Action taken on unsafe text when a request names none
    #[serde(default)]
    pub action: PolicyAction,

    /// TOML file with extra category rules for the guard
    #[serde(default)]
    pub rules_path: Option<PathBuf>,
}

impl PolicyConfig {
    #[must_use]
    pub fn to_settings(&self) -> PolicySettings {
        PolicySettings {
            action: self.action,
            policy: POLICY_SUMMARY.to_string(),
        }
    }
}
