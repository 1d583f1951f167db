//! Process startup shared by the service binaries

use std::{future::IntoFuture, sync::Arc, time::Duration};

use anyhow::{Context, bail};
use application::{PiiService, PolicyService, ToxicityService};
use infrastructure::{
    AppConfig, GazetteerNerAdapter, LexiconToxicityClassifier, LoggingConfig,
    RegexPatternRecognizer, RulePolicyGuard, SecurityValidator, ServiceKind,
    WordListProfanityFilter, init_logging,
};
use tokio::{net::TcpListener, signal, sync::Notify};
use tracing::{info, warn};

use crate::{
    error::set_expose_internal_errors,
    routes::build_app,
    state::{AppState, Guard},
};

/// Load the detection backends for `service` and wrap them in its validator
pub fn build_guard(service: ServiceKind, config: &AppConfig) -> anyhow::Result<Guard> {
    let guard = match service {
        ServiceKind::Pii => {
            let patterns = RegexPatternRecognizer::new(config.pii.language_model.clone())?;
            info!(
                language = %config.pii.language,
                language_model = patterns.language_model(),
                "Pattern recognizer compiled"
            );
            let entities = GazetteerNerAdapter::load(&config.pii.gazetteer_config())
                .context("Failed to load the semantic recognizer")?;
            Guard::Pii(Arc::new(PiiService::new(
                Arc::new(patterns),
                Arc::new(entities),
                config.pii.to_settings(),
            )))
        },
        ServiceKind::Toxicity => {
            let classifier = LexiconToxicityClassifier::new(config.toxicity.model);
            let profanity = WordListProfanityFilter::new(&config.toxicity.profanity_extra_words)?;
            Guard::Toxicity(Arc::new(ToxicityService::new(
                Arc::new(classifier),
                Arc::new(profanity),
                config.toxicity.to_settings(),
            )))
        },
        ServiceKind::Policy => {
            let guard = RulePolicyGuard::load(config.policy.rules_path.as_deref())
                .context("Failed to load policy rules")?;
            Guard::Policy(Arc::new(PolicyService::new(
                Arc::new(guard),
                config.policy.to_settings(),
            )))
        },
    };
    Ok(guard)
}

/// Run `service` until SIGINT or SIGTERM
pub async fn run(service: ServiceKind) -> anyhow::Result<()> {
    let config = AppConfig::load(service).context("Failed to load configuration")?;

    init_logging(&LoggingConfig::for_service(service, &config.server))?;

    info!(
        service = %service,
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment.unwrap_or_default(),
        "{} starting",
        service.title()
    );

    let warnings = SecurityValidator::validate(&config, service);
    SecurityValidator::log_warnings(&warnings);
    if SecurityValidator::should_block_startup(
        &config,
        &warnings,
        SecurityValidator::allow_insecure_from_env(),
    ) {
        bail!(
            "Refusing to start with critical security warnings; set {} to override",
            infrastructure::validation::ALLOW_INSECURE_VAR
        );
    }

    set_expose_internal_errors(!config.is_production());

    let guard = build_guard(service, &config)?;
    for component in guard.readiness().components {
        info!(
            component = %component.name,
            backend = %component.backend,
            ready = component.ready,
            "Backend loaded"
        );
    }

    let app = build_app(AppState::new(guard), &config);

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(address = %addr, "Listening");

    let drain_timeout = Duration::from_secs(config.server.shutdown_timeout_secs.unwrap_or(30));
    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, app)
        .with_graceful_shutdown({
            let shutdown = Arc::clone(&shutdown);
            async move {
                shutdown_signal().await;
                shutdown.notify_one();
            }
        })
        .into_future();

    tokio::select! {
        result = server => result?,
        () = async {
            shutdown.notified().await;
            tokio::time::sleep(drain_timeout).await;
        } => {
            warn!(timeout = ?drain_timeout, "Drain timeout elapsed, closing open connections");
        }
    }

    info!("Shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, draining connections"),
        () = terminate => info!("Received SIGTERM, draining connections"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_each_guard_from_defaults() {
        for service in [ServiceKind::Pii, ServiceKind::Toxicity, ServiceKind::Policy] {
            let guard = build_guard(service, &AppConfig::default()).unwrap();
            assert_eq!(guard.kind(), service);
            assert!(guard.readiness().ready, "{service}");
        }
    }

    #[test]
    fn missing_policy_rules_fail_startup() {
        let mut config = AppConfig::default();
        config.policy.rules_path = Some("/nonexistent/policy.toml".into());
        let err = build_guard(ServiceKind::Policy, &config).unwrap_err();
        assert!(err.to_string().contains("policy rules"));
    }

    #[test]
    fn offline_pii_without_model_dir_fails_startup() {
        let mut config = AppConfig::default();
        config.pii.offline = true;
        assert!(build_guard(ServiceKind::Pii, &config).is_err());
    }
}
