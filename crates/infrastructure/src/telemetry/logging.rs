//! Subscriber setup for the service binaries

use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ServerConfig, ServiceKind};

/// Output format of the console logger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Configuration for the console logger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset
    pub filter: String,
}

impl LoggingConfig {
    /// Settings for `service`, defaulting the filter to
    /// `<crate_name>=info,tower_http=info`
    pub fn for_service(service: ServiceKind, server: &ServerConfig) -> Self {
        let filter = server.log_filter.clone().unwrap_or_else(|| {
            format!(
                "{}=info,presentation_http=info,application=info,infrastructure=info,tower_http=info",
                service.name().replace('-', "_")
            )
        });
        Self {
            format: server.log_format,
            filter,
        }
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over [`LoggingConfig::filter`]. Fails if a
/// global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true),
            )
            .try_init(),
    };
    result.map_err(|e| TelemetryError::Init(e.to_string()))?;

    info!(format = ?config.format, "Logging initialized");
    Ok(())
}

/// Error type for logging initialization
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to initialize tracing subscriber
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}
