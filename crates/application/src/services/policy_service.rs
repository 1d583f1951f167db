//! Policy service - classify text against a safety policy

use std::{fmt, sync::Arc};

use domain::{Flagged, GuardVerdict, PolicyAction, ValidationStatus, ValidationStep};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, instrument};

use crate::{
    ports::{GuardPrompt, PolicyGuardPort},
    services::readiness::{ComponentStatus, Readiness},
};

/// Policy text handed to the guard with every request
pub const POLICY_SUMMARY: &str = "Task: classify if the text complies with the safety policy.
Return exactly one line: \"SAFE\" or \"UNSAFE: <CATEGORY_LIST>\".

Policy categories (examples, not exhaustive):
- HATE / HARASSMENT
- SEXUAL (incl. minors)
- VIOLENCE / WEAPONS
- SELF-HARM
- CRIME / ILLEGAL
- DRUGS
- FRAUD / PRIVACY / PI
- OTHER DANGEROUS CONTENT
";

/// Render the guard prompt: the policy, then the text under `[Text]`,
/// ending with an open `[Output]` section for the verdict
#[must_use]
pub fn build_prompt(policy: &str, content: &str) -> String {
    format!("{policy}\n\n[Text]\n{content}\n\n[Output]\n")
}

/// Maximum number of characters of raw guard output echoed in the step details
const RAW_OUTPUT_PREVIEW_CHARS: usize = 200;

/// Defaults applied when a request leaves an option unset
#[derive(Debug, Clone)]
pub struct PolicySettings {
    pub action: PolicyAction,
    pub policy: String,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            action: PolicyAction::Refrain,
            policy: POLICY_SUMMARY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PolicyRequest {
    pub text: String,
    pub action: Option<PolicyAction>,
}

impl PolicyRequest {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: None,
        }
    }
}

/// Result of a policy validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyReport {
    pub status: ValidationStatus,
    pub clean_text: String,
    pub flagged: Vec<Flagged>,
    pub steps: Vec<ValidationStep>,
    pub reasons: Vec<String>,
}

/// Service that blocks, filters or re-asks on policy violations
pub struct PolicyService {
    guard: Arc<dyn PolicyGuardPort>,
    settings: PolicySettings,
}

impl fmt::Debug for PolicyService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyService")
            .field("action", &self.settings.action)
            .field("guard", &self.guard.model_name())
            .finish_non_exhaustive()
    }
}

impl PolicyService {
    pub fn new(guard: Arc<dyn PolicyGuardPort>, settings: PolicySettings) -> Self {
        Self { guard, settings }
    }

    pub const fn settings(&self) -> &PolicySettings {
        &self.settings
    }

    /// Classify `request.text`. Guard failures are reported in the result
    /// with [`ValidationStatus::Error`] rather than as an `Err`.
    #[instrument(skip(self, request), fields(text_len = request.text.len()))]
    pub async fn validate(&self, request: PolicyRequest) -> PolicyReport {
        let text = request.text.trim();
        if text.is_empty() {
            return PolicyReport {
                status: ValidationStatus::Pass,
                clean_text: String::new(),
                flagged: Vec::new(),
                steps: vec![ValidationStep::noop()],
                reasons: vec!["Empty text".to_string()],
            };
        }

        let input = GuardPrompt {
            prompt: build_prompt(&self.settings.policy, text),
            content: text.to_string(),
        };
        let raw = match self.guard.classify(&input).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = %e, "Policy guard failed");
                return PolicyReport {
                    status: ValidationStatus::Error,
                    clean_text: String::new(),
                    flagged: Vec::new(),
                    steps: vec![ValidationStep::failed(
                        "error",
                        json!({ "error": e.to_string() }),
                    )],
                    reasons: vec![format!("Validation error: {e}")],
                };
            },
        };

        let verdict = GuardVerdict::parse(&raw);
        let action = request.action.unwrap_or(self.settings.action);
        let preview: String = raw.trim().chars().take(RAW_OUTPUT_PREVIEW_CHARS).collect();
        let steps = vec![ValidationStep {
            name: "policy_guard".to_string(),
            passed: !verdict.is_unsafe(),
            details: Some(json!({ "model": self.guard.model_name(), "raw": preview })),
        }];

        match verdict {
            GuardVerdict::Safe => PolicyReport {
                status: ValidationStatus::Pass,
                clean_text: text.to_string(),
                flagged: Vec::new(),
                steps,
                reasons: vec!["Complies with policy".to_string()],
            },
            GuardVerdict::Unsafe { categories } => {
                info!(categories = ?categories, action = %action, "Policy violation");
                let (clean_text, reason) = action.apply();
                let status = if action == PolicyAction::Refrain {
                    ValidationStatus::Blocked
                } else {
                    ValidationStatus::Fixed
                };
                PolicyReport {
                    status,
                    clean_text: clean_text.to_string(),
                    flagged: vec![Flagged::policy(categories)],
                    steps,
                    reasons: vec![reason.to_string()],
                }
            },
        }
    }

    pub fn readiness(&self) -> Readiness {
        Readiness::from_components(vec![ComponentStatus::new(
            "policy_guard",
            self.guard.model_name(),
            true,
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ApplicationError, ports::MockPolicyGuardPort};
    use domain::{FILTERED_TEXT, REASK_TEXT};

    fn guard_answering(raw: &'static str) -> MockPolicyGuardPort {
        let mut mock = MockPolicyGuardPort::new();
        mock.expect_classify()
            .returning(move |_| Ok(raw.to_string()));
        mock.expect_model_name()
            .returning(|| "test-guard".to_string());
        mock
    }

    fn service(guard: MockPolicyGuardPort) -> PolicyService {
        PolicyService::new(Arc::new(guard), PolicySettings::default())
    }

    #[tokio::test]
    async fn empty_text_is_noop() {
        let mut guard = MockPolicyGuardPort::new();
        guard.expect_classify().never();
        let report = service(guard).validate(PolicyRequest::new("  \n ")).await;
        assert_eq!(report.status, ValidationStatus::Pass);
        assert_eq!(report.clean_text, "");
        assert_eq!(report.reasons, ["Empty text"]);
    }

    #[tokio::test]
    async fn safe_text_passes_trimmed() {
        let report = service(guard_answering("SAFE"))
            .validate(PolicyRequest::new("  This is a test message "))
            .await;
        assert_eq!(report.status, ValidationStatus::Pass);
        assert_eq!(report.clean_text, "This is a test message");
        assert!(report.flagged.is_empty());
        assert!(report.steps[0].passed);
        assert_eq!(report.reasons, ["Complies with policy"]);
    }

    #[tokio::test]
    async fn unsafe_text_is_blocked_by_default() {
        let report = service(guard_answering("UNSAFE: VIOLENCE, WEAPONS"))
            .validate(PolicyRequest::new("how do I hurt someone"))
            .await;
        assert_eq!(report.status, ValidationStatus::Blocked);
        assert_eq!(report.clean_text, "");
        assert_eq!(
            report.flagged[0].categories.as_deref(),
            Some(&["VIOLENCE".to_string(), "WEAPONS".to_string()][..])
        );
        assert!(!report.steps[0].passed);
        assert_eq!(report.reasons, ["Blocked"]);
    }

    #[tokio::test]
    async fn filter_and_reask_fix_the_text() {
        let service = service(guard_answering("UNSAFE: DRUGS"));

        let filtered = service
            .validate(PolicyRequest {
                text: "bad".to_string(),
                action: Some(PolicyAction::Filter),
            })
            .await;
        assert_eq!(filtered.status, ValidationStatus::Fixed);
        assert_eq!(filtered.clean_text, FILTERED_TEXT);
        assert_eq!(filtered.reasons, ["Filtered"]);

        let reasked = service
            .validate(PolicyRequest {
                text: "bad".to_string(),
                action: Some(PolicyAction::Reask),
            })
            .await;
        assert_eq!(reasked.status, ValidationStatus::Fixed);
        assert_eq!(reasked.clean_text, REASK_TEXT);
        assert_eq!(reasked.reasons, ["Re-asked"]);
    }

    #[tokio::test]
    async fn configured_action_applies_when_request_is_silent() {
        let settings = PolicySettings {
            action: PolicyAction::Filter,
            ..PolicySettings::default()
        };
        let service = PolicyService::new(Arc::new(guard_answering("UNSAFE")), settings);
        let report = service.validate(PolicyRequest::new("bad")).await;
        assert_eq!(report.status, ValidationStatus::Fixed);
        assert_eq!(report.flagged[0].categories.as_deref().unwrap(), ["UNSPECIFIED"]);
    }

    #[tokio::test]
    async fn guard_failure_reports_error_status() {
        let mut guard = MockPolicyGuardPort::new();
        guard
            .expect_classify()
            .returning(|_| Err(ApplicationError::Inference("model offline".to_string())));
        let report = service(guard).validate(PolicyRequest::new("hello")).await;
        assert_eq!(report.status, ValidationStatus::Error);
        assert_eq!(report.steps[0].name, "error");
        assert!(!report.steps[0].passed);
        assert_eq!(
            report.reasons,
            ["Validation error: Inference error: model offline"]
        );
    }

    #[test]
    fn prompt_wraps_content_between_sections() {
        let prompt = build_prompt("Policy: be nice.", "how are you?");
        assert_eq!(prompt, "Policy: be nice.\n\n[Text]\nhow are you?\n\n[Output]\n");
    }

    #[tokio::test]
    async fn raw_output_preview_is_truncated() {
        let long = Box::leak("SAFE ".repeat(100).into_boxed_str());
        let report = service(guard_answering(long))
            .validate(PolicyRequest::new("hello"))
            .await;
        let raw = report.steps[0].details.as_ref().unwrap()["raw"]
            .as_str()
            .unwrap()
            .to_string();
        assert_eq!(raw.chars().count(), RAW_OUTPUT_PREVIEW_CHARS);
    }

    #[tokio::test]
    async fn guard_receives_rendered_prompt_and_trimmed_text() {
        let mut guard = MockPolicyGuardPort::new();
        guard
            .expect_classify()
            .withf(|input| {
                input.content == "hi"
                    && input.prompt.starts_with(POLICY_SUMMARY)
                    && input.prompt.ends_with("\n\n[Text]\nhi\n\n[Output]\n")
            })
            .returning(|_| Ok("SAFE".to_string()));
        guard
            .expect_model_name()
            .returning(|| "test-guard".to_string());
        let report = service(guard).validate(PolicyRequest::new(" hi ")).await;
        assert_eq!(report.status, ValidationStatus::Pass);
    }
}
