//! Configuration validation module
//!
//! Provides security validation and startup checks for service configuration.

pub mod security;

pub use security::{ALLOW_INSECURE_VAR, SecurityValidator, SecurityWarning, WarningSeverity};
