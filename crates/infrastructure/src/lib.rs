//! Infrastructure layer - Adapters and process plumbing
//!
//! Implements the ports defined in the application layer and provides
//! configuration loading, logging setup and startup security checks.

pub mod adapters;
pub mod config;
pub mod telemetry;
pub mod validation;

pub use adapters::*;
pub use config::{
    AppConfig, ConfigLoadError, Environment, PiiConfig, PolicyConfig, SecurityConfig,
    ServerConfig, ServiceKind, ToxicityConfig, ToxicityModelFamily,
};
pub use telemetry::{LogFormat, LoggingConfig, TelemetryError, init_logging};
pub use validation::{SecurityValidator, SecurityWarning, WarningSeverity};
