//! Service configuration
//!
//! Split into focused sub-modules:
//! - `server`: HTTP listener, CORS and logging settings
//! - `security`: API keys
//! - `pii`, `toxicity`, `policy`: validator defaults per service
//! - `legacy_env`: the flat environment names the services historically read
//!
//! Sources are layered in this order, later sources winning: built-in
//! defaults, an optional `config.toml`, `GUARD_*` variables (`__` between
//! nesting levels, e.g. `GUARD_SERVER__PORT`), then the legacy names.

mod legacy_env;
mod pii;
mod policy;
mod security;
mod server;
mod toxicity;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use pii::PiiConfig;
pub use policy::PolicyConfig;
pub use security::SecurityConfig;
pub use server::ServerConfig;
pub use toxicity::{ToxicityConfig, ToxicityModelFamily};

/// Prefix of the structured environment variables
pub const ENV_PREFIX: &str = "GUARD";

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Errors raised while assembling the configuration
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),

    #[error("Invalid value for {var}: {reason}")]
    InvalidEnv { var: String, reason: String },
}

impl ConfigLoadError {
    pub(crate) fn invalid_env(var: &str, reason: impl fmt::Display) -> Self {
        Self::InvalidEnv {
            var: var.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Application environment (development or production)
///
/// Controls security validation strictness and error verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment - relaxed security warnings
    #[default]
    Development,
    /// Production environment - strict security validation
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(format!(
                "Invalid environment: {s}. Use 'development' or 'production'"
            )),
        }
    }
}

/// Which of the three validators a process serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Pii,
    Toxicity,
    Policy,
}

impl ServiceKind {
    /// Binary and log target name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pii => "pii-service",
            Self::Toxicity => "tox-service",
            Self::Policy => "policy-service",
        }
    }

    /// Human readable title
    pub const fn title(self) -> &'static str {
        match self {
            Self::Pii => "PII Protection Service",
            Self::Toxicity => "Toxicity & Profanity Service",
            Self::Policy => "Policy Guard Service",
        }
    }

    /// Environment variable holding the comma separated API keys
    pub const fn api_keys_var(self) -> &'static str {
        match self {
            Self::Pii => "PII_API_KEYS",
            Self::Toxicity => "TOX_API_KEYS",
            Self::Policy => "POLICY_API_KEYS",
        }
    }

    pub const fn default_port(self) -> u16 {
        match self {
            Self::Pii => 8001,
            Self::Toxicity => 8002,
            Self::Policy => 8003,
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development or production)
    ///
    /// In production, critical security warnings prevent startup unless
    /// `GUARD_ALLOW_INSECURE_CONFIG=true`.
    #[serde(default)]
    pub environment: Option<Environment>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    /// PII redaction defaults
    #[serde(default)]
    pub pii: PiiConfig,

    /// Toxicity and profanity defaults
    #[serde(default)]
    pub toxicity: ToxicityConfig,

    /// Policy guard defaults
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl AppConfig {
    /// Load configuration for `service` from all sources
    ///
    /// A `.env` file in the working directory is read first, so its values
    /// behave like process environment variables.
    pub fn load(service: ServiceKind) -> Result<Self, ConfigLoadError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }

        let builder = Self::builder(service)?
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.apply_legacy_env(service, |var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Build configuration from an in-memory TOML document on top of the
    /// service defaults. Environment variables are not consulted.
    pub fn from_toml_str(service: ServiceKind, toml: &str) -> Result<Self, ConfigLoadError> {
        let config = Self::builder(service)?
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    fn builder(
        service: ServiceKind,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigLoadError> {
        Ok(config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", i64::from(service.default_port()))?)
    }

    /// Overlay the flat legacy variable names using `lookup`
    pub fn apply_legacy_env<F>(&mut self, service: ServiceKind, lookup: F) -> Result<(), ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        legacy_env::apply(self, service, &lookup)
    }

    /// Whether the configured environment is production
    pub fn is_production(&self) -> bool {
        self.environment == Some(Environment::Production)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::LogFormat;
    use secrecy::ExposeSecret;

    #[test]
    fn environment_parses_short_names() {
        assert_eq!("prod".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("Development".parse::<Environment>(), Ok(Environment::Development));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn service_kinds_have_distinct_ports_and_key_vars() {
        let kinds = [ServiceKind::Pii, ServiceKind::Toxicity, ServiceKind::Policy];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a.default_port(), b.default_port());
                assert_ne!(a.api_keys_var(), b.api_keys_var());
            }
        }
        assert_eq!(ServiceKind::Toxicity.to_string(), "tox-service");
    }

    #[test]
    fn defaults_depend_on_service() {
        let config = AppConfig::from_toml_str(ServiceKind::Policy, "").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8003);
        assert!(!config.security.has_api_keys());
        assert!(!config.is_production());
    }

    #[test]
    fn toml_document_overrides_defaults() {
        let config = AppConfig::from_toml_str(
            ServiceKind::Pii,
            r#"
            environment = "production"

            [server]
            port = 9100
            allowed_origins = ["https://app.example.com"]
            log_format = "json"

            [security]
            api_keys = ["0123456789abcdef"]

            [pii]
            entities = ["EMAIL_ADDRESS"]
            semantic_threshold = 0.7
            "#,
        )
        .unwrap();

        assert!(config.is_production());
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.server.allowed_origins, ["https://app.example.com"]);
        assert_eq!(config.security.api_keys[0].expose_secret(), "0123456789abcdef");
        assert_eq!(config.pii.entities, ["EMAIL_ADDRESS"]);
        assert!((config.pii.semantic_threshold - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_toml_is_a_source_error() {
        let err = AppConfig::from_toml_str(ServiceKind::Pii, "[server\nport = ").unwrap_err();
        assert!(matches!(err, ConfigLoadError::Source(_)));
    }

    #[test]
    fn serialized_config_never_contains_keys() {
        let mut config = AppConfig::default();
        config
            .apply_legacy_env(ServiceKind::Pii, |var| {
                (var == "PII_API_KEYS").then(|| "super-secret-key-value".to_string())
            })
            .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("super-secret-key-value"));
        assert!(!format!("{config:?}").contains("super-secret-key-value"));
    }
}
