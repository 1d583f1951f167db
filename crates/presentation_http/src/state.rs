//! Application state shared across handlers

use std::sync::Arc;

use application::{PiiService, PolicyService, Readiness, ToxicityService};
use infrastructure::ServiceKind;

use crate::handlers::metrics::MetricsCollector;

/// The validator a process serves
#[derive(Debug, Clone)]
pub enum Guard {
    Pii(Arc<PiiService>),
    Toxicity(Arc<ToxicityService>),
    Policy(Arc<PolicyService>),
}

impl Guard {
    #[must_use]
    pub const fn kind(&self) -> ServiceKind {
        match self {
            Self::Pii(_) => ServiceKind::Pii,
            Self::Toxicity(_) => ServiceKind::Toxicity,
            Self::Policy(_) => ServiceKind::Policy,
        }
    }

    #[must_use]
    pub fn readiness(&self) -> Readiness {
        match self {
            Self::Pii(service) => service.readiness(),
            Self::Toxicity(service) => service.readiness(),
            Self::Policy(service) => service.readiness(),
        }
    }
}

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub guard: Guard,
    pub metrics: Arc<MetricsCollector>,
}

impl AppState {
    #[must_use]
    pub fn new(guard: Guard) -> Self {
        Self {
            guard,
            metrics: Arc::new(MetricsCollector::new()),
        }
    }

    #[must_use]
    pub const fn service(&self) -> ServiceKind {
        self.guard.kind()
    }

    /// State handed to the `/validate` handler of one validator
    #[must_use]
    pub fn validator<T>(&self, service: &Arc<T>) -> ValidatorState<T> {
        ValidatorState {
            service: Arc::clone(service),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

/// A validator together with the metrics it reports to
#[derive(Debug)]
pub struct ValidatorState<T> {
    pub service: Arc<T>,
    pub metrics: Arc<MetricsCollector>,
}

impl<T> Clone for ValidatorState<T> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            metrics: Arc::clone(&self.metrics),
        }
    }
}
