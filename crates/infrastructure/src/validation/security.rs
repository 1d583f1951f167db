//! Security validation for service configuration
//!
//! Validates configuration for security issues and provides warnings at startup.
//! Critical issues in production will prevent startup unless explicitly allowed.

use std::fmt;

use crate::config::{AppConfig, ServiceKind};

/// Environment variable that lets a production process start despite
/// critical warnings
pub const ALLOW_INSECURE_VAR: &str = "GUARD_ALLOW_INSECURE_CONFIG";

/// Severity level for security warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WarningSeverity {
    /// Informational - no action required
    Info,
    /// Warning - should be addressed but not critical
    Warning,
    /// Critical - must be addressed in production
    Critical,
}

impl fmt::Display for WarningSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A security warning with severity and description
#[derive(Debug, Clone)]
pub struct SecurityWarning {
    pub severity: WarningSeverity,
    /// Short code identifying the warning type
    pub code: String,
    pub message: String,
    /// Recommended action to resolve the issue
    pub recommendation: String,
}

impl SecurityWarning {
    #[must_use]
    pub fn new(
        severity: WarningSeverity,
        code: impl Into<String>,
        message: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            recommendation: recommendation.into(),
        }
    }

    #[must_use]
    pub fn critical(
        code: impl Into<String>,
        message: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self::new(WarningSeverity::Critical, code, message, recommendation)
    }

    #[must_use]
    pub fn warning(
        code: impl Into<String>,
        message: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self::new(WarningSeverity::Warning, code, message, recommendation)
    }

    #[must_use]
    pub const fn is_critical(&self) -> bool {
        matches!(self.severity, WarningSeverity::Critical)
    }
}

impl fmt::Display for SecurityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} - {}",
            self.severity, self.code, self.message, self.recommendation
        )
    }
}

/// Validates service configuration for security issues
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityValidator;

impl SecurityValidator {
    /// Validate configuration and return all security warnings
    ///
    /// Returns a list of warnings sorted by severity (critical first).
    #[must_use]
    pub fn validate(config: &AppConfig, service: ServiceKind) -> Vec<SecurityWarning> {
        let mut warnings = Vec::new();
        let is_production = config.is_production();

        Self::check_api_keys(config, service, is_production, &mut warnings);
        Self::check_cors_configuration(config, is_production, &mut warnings);
        Self::check_thresholds(config, service, &mut warnings);

        warnings.sort_by(|a, b| b.severity.cmp(&a.severity));
        warnings
    }

    /// Check if startup should be blocked due to critical security issues
    #[must_use]
    pub fn should_block_startup(
        config: &AppConfig,
        warnings: &[SecurityWarning],
        allow_insecure: bool,
    ) -> bool {
        let has_critical = warnings.iter().any(SecurityWarning::is_critical);
        config.is_production() && has_critical && !allow_insecure
    }

    /// Read [`ALLOW_INSECURE_VAR`] from the process environment
    #[must_use]
    pub fn allow_insecure_from_env() -> bool {
        std::env::var(ALLOW_INSECURE_VAR)
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false)
    }

    /// Log all warnings using tracing
    pub fn log_warnings(warnings: &[SecurityWarning]) {
        for warning in warnings {
            match warning.severity {
                WarningSeverity::Critical => {
                    tracing::error!(
                        code = %warning.code,
                        message = %warning.message,
                        recommendation = %warning.recommendation,
                        "Security configuration issue"
                    );
                },
                WarningSeverity::Warning => {
                    tracing::warn!(
                        code = %warning.code,
                        message = %warning.message,
                        recommendation = %warning.recommendation,
                        "Security configuration warning"
                    );
                },
                WarningSeverity::Info => {
                    tracing::info!(
                        code = %warning.code,
                        message = %warning.message,
                        recommendation = %warning.recommendation,
                        "Security configuration notice"
                    );
                },
            }
        }
    }

    fn check_api_keys(
        config: &AppConfig,
        service: ServiceKind,
        is_production: bool,
        warnings: &mut Vec<SecurityWarning>,
    ) {
        if !config.security.has_api_keys() {
            let severity = if is_production {
                WarningSeverity::Critical
            } else {
                WarningSeverity::Warning
            };
            warnings.push(SecurityWarning::new(
                severity,
                "GRD001",
                "No API keys configured; /validate is open to every caller",
                format!("Set {} to a comma separated list of keys", service.api_keys_var()),
            ));
            return;
        }

        let short = config.security.count_short_keys();
        if short > 0 {
            warnings.push(SecurityWarning::warning(
                "GRD002",
                format!(
                    "{short} API key(s) shorter than {} characters",
                    config.security.min_key_length
                ),
                "Use long random keys, e.g. `openssl rand -hex 32`",
            ));
        }
    }

    fn check_cors_configuration(
        config: &AppConfig,
        is_production: bool,
        warnings: &mut Vec<SecurityWarning>,
    ) {
        if config.server.allows_any_origin() {
            let severity = if is_production {
                WarningSeverity::Warning
            } else {
                WarningSeverity::Info
            };
            warnings.push(SecurityWarning::new(
                severity,
                "GRD003",
                "CORS allows every origin",
                "Set CORS_ALLOWED_ORIGINS to the origins that call this service",
            ));
        }
    }

    fn check_thresholds(
        config: &AppConfig,
        service: ServiceKind,
        warnings: &mut Vec<SecurityWarning>,
    ) {
        let mut thresholds: Vec<(String, f64)> = Vec::new();
        match service {
            ServiceKind::Pii => {
                thresholds.push(("semantic_threshold".to_string(), config.pii.semantic_threshold));
                thresholds.extend(
                    config
                        .pii
                        .entity_thresholds
                        .iter()
                        .map(|(entity, value)| (format!("entity_thresholds.{entity}"), *value)),
                );
            },
            ServiceKind::Toxicity => {
                thresholds.push(("threshold".to_string(), config.toxicity.threshold));
            },
            ServiceKind::Policy => {},
        }

        for (name, value) in thresholds {
            if domain::errors::check_threshold(&name, value).is_err() {
                warnings.push(SecurityWarning::critical(
                    "GRD004",
                    format!("Threshold {name} = {value} is outside [0, 1]"),
                    "Every request would be rejected; use a value between 0 and 1",
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Environment, SecurityConfig};

    fn secure_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.server.allowed_origins = vec!["https://example.com".to_string()];
        config.security.api_keys = SecurityConfig::parse_key_list("0123456789abcdef0123");
        config
    }

    fn production(mut config: AppConfig) -> AppConfig {
        config.environment = Some(Environment::Production);
        config
    }

    #[test]
    fn secure_config_has_no_warnings() {
        let warnings = SecurityValidator::validate(&secure_config(), ServiceKind::Pii);
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn missing_keys_warn_in_development() {
        let warnings = SecurityValidator::validate(&AppConfig::default(), ServiceKind::Toxicity);
        let warning = warnings.iter().find(|w| w.code == "GRD001").unwrap();
        assert_eq!(warning.severity, WarningSeverity::Warning);
        assert!(warning.recommendation.contains("TOX_API_KEYS"));
    }

    #[test]
    fn missing_keys_are_critical_in_production() {
        let config = production(AppConfig::default());
        let warnings = SecurityValidator::validate(&config, ServiceKind::Pii);
        assert!(warnings.iter().find(|w| w.code == "GRD001").unwrap().is_critical());
        assert!(SecurityValidator::should_block_startup(&config, &warnings, false));
        assert!(!SecurityValidator::should_block_startup(&config, &warnings, true));
    }

    #[test]
    fn short_keys_warn() {
        let mut config = secure_config();
        config.security.api_keys = SecurityConfig::parse_key_list("abc");
        let warnings = SecurityValidator::validate(&config, ServiceKind::Pii);
        assert!(warnings.iter().any(|w| w.code == "GRD002"));
    }

    #[test]
    fn wildcard_cors_is_reported() {
        let mut config = secure_config();
        config.server.allowed_origins = vec!["*".to_string()];
        let dev = SecurityValidator::validate(&config, ServiceKind::Pii);
        assert_eq!(dev[0].severity, WarningSeverity::Info);

        let prod = SecurityValidator::validate(&production(config), ServiceKind::Pii);
        assert_eq!(prod[0].code, "GRD003");
        assert_eq!(prod[0].severity, WarningSeverity::Warning);
    }

    #[test]
    fn out_of_range_thresholds_are_critical_for_their_service() {
        let mut config = secure_config();
        config.toxicity.threshold = 1.5;
        config
            .pii
            .entity_thresholds
            .insert("PERSON".to_string(), -0.1);

        let tox = SecurityValidator::validate(&config, ServiceKind::Toxicity);
        assert_eq!(tox.len(), 1);
        assert!(tox[0].message.contains("threshold = 1.5"));

        let pii = SecurityValidator::validate(&config, ServiceKind::Pii);
        assert!(pii[0].message.contains("entity_thresholds.PERSON"));

        assert!(SecurityValidator::validate(&config, ServiceKind::Policy).is_empty());
    }

    #[test]
    fn development_never_blocks_startup() {
        let config = AppConfig::default();
        let warnings = vec![SecurityWarning::critical("X", "m", "r")];
        assert!(!SecurityValidator::should_block_startup(&config, &warnings, false));
    }

    #[test]
    fn warnings_sorted_by_severity() {
        let mut config = production(AppConfig::default());
        config.toxicity.threshold = 2.0;
        let warnings = SecurityValidator::validate(&config, ServiceKind::Toxicity);
        for pair in warnings.windows(2) {
            assert!(pair[0].severity >= pair[1].severity);
        }
    }

    #[test]
    fn warning_display_format() {
        let warning = SecurityWarning::critical("GRD001", "Test message", "Test recommendation");
        let display = format!("{warning}");
        assert!(display.contains("CRITICAL"));
        assert!(display.contains("GRD001"));
        assert!(display.contains("Test message"));
        assert!(display.contains("Test recommendation"));
    }

    #[test]
    fn severity_ordering() {
        assert!(WarningSeverity::Critical > WarningSeverity::Warning);
        assert!(WarningSeverity::Warning > WarningSeverity::Info);
    }
}
