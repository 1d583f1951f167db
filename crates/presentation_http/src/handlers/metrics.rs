//! Metrics and observability handlers
//!
//! Request and validation counters kept in atomics, exposed as JSON and in
//! the Prometheus text format.

use std::{
    fmt::Write as _,
    sync::atomic::{AtomicU64, Ordering},
    time::Instant,
};

use axum::{Json, extract::State};
use domain::ValidationStatus;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Metrics response containing all service metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub app: AppMetrics,
    pub requests: RequestMetrics,
    pub validations: ValidationMetrics,
}

/// Service metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppMetrics {
    pub name: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Request statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMetrics {
    pub total_requests: u64,
    /// Successful requests (2xx)
    pub success_count: u64,
    /// Client errors (4xx)
    pub client_error_count: u64,
    /// Server errors (5xx)
    pub server_error_count: u64,
    pub avg_response_time_ms: f64,
    pub active_requests: u64,
}

/// Outcome counts of `/validate` calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub total: u64,
    pub pass: u64,
    pub fixed: u64,
    pub blocked: u64,
    /// Results reported with `status: error`
    pub error: u64,
    /// Calls that ended in an error response
    pub failed: u64,
    pub avg_validation_time_ms: f64,
}

/// Atomic counters for request metrics
#[derive(Debug)]
pub struct MetricsCollector {
    start_time: Instant,
    total_requests: AtomicU64,
    success_count: AtomicU64,
    client_error_count: AtomicU64,
    server_error_count: AtomicU64,
    active_requests: AtomicU64,
    /// Total response time in microseconds
    total_response_time_us: AtomicU64,
    validations: AtomicU64,
    validations_pass: AtomicU64,
    validations_fixed: AtomicU64,
    validations_blocked: AtomicU64,
    validations_error: AtomicU64,
    validations_failed: AtomicU64,
    /// Total validation time in microseconds
    total_validation_time_us: AtomicU64,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn average_ms(total_us: u64, count: u64) -> f64 {
    if count > 0 {
        (total_us as f64) / (count as f64) / 1000.0
    } else {
        0.0
    }
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            total_requests: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            client_error_count: AtomicU64::new(0),
            server_error_count: AtomicU64::new(0),
            active_requests: AtomicU64::new(0),
            total_response_time_us: AtomicU64::new(0),
            validations: AtomicU64::new(0),
            validations_pass: AtomicU64::new(0),
            validations_fixed: AtomicU64::new(0),
            validations_blocked: AtomicU64::new(0),
            validations_error: AtomicU64::new(0),
            validations_failed: AtomicU64::new(0),
            total_validation_time_us: AtomicU64::new(0),
        }
    }

    /// Record start of a request
    pub fn request_start(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.active_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record end of a request
    pub fn request_end(&self, response_time_us: u64, status_code: u16) {
        self.active_requests.fetch_sub(1, Ordering::Relaxed);
        self.total_response_time_us
            .fetch_add(response_time_us, Ordering::Relaxed);

        let counter = match status_code {
            200..=299 => &self.success_count,
            400..=499 => &self.client_error_count,
            500..=599 => &self.server_error_count,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished validation; `None` when it failed with an error
    /// response
    pub fn record_validation(&self, status: Option<ValidationStatus>, duration_us: u64) {
        self.validations.fetch_add(1, Ordering::Relaxed);
        self.total_validation_time_us
            .fetch_add(duration_us, Ordering::Relaxed);

        let counter = match status {
            Some(ValidationStatus::Pass) => &self.validations_pass,
            Some(ValidationStatus::Fixed) => &self.validations_fixed,
            Some(ValidationStatus::Blocked) => &self.validations_blocked,
            Some(ValidationStatus::Error) => &self.validations_error,
            None => &self.validations_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    #[must_use]
    pub fn request_metrics(&self) -> RequestMetrics {
        let total = self.total_requests.load(Ordering::Relaxed);
        RequestMetrics {
            total_requests: total,
            success_count: self.success_count.load(Ordering::Relaxed),
            client_error_count: self.client_error_count.load(Ordering::Relaxed),
            server_error_count: self.server_error_count.load(Ordering::Relaxed),
            avg_response_time_ms: average_ms(
                self.total_response_time_us.load(Ordering::Relaxed),
                total,
            ),
            active_requests: self.active_requests.load(Ordering::Relaxed),
        }
    }

    #[must_use]
    pub fn validation_metrics(&self) -> ValidationMetrics {
        let total = self.validations.load(Ordering::Relaxed);
        ValidationMetrics {
            total,
            pass: self.validations_pass.load(Ordering::Relaxed),
            fixed: self.validations_fixed.load(Ordering::Relaxed),
            blocked: self.validations_blocked.load(Ordering::Relaxed),
            error: self.validations_error.load(Ordering::Relaxed),
            failed: self.validations_failed.load(Ordering::Relaxed),
            avg_validation_time_ms: average_ms(
                self.total_validation_time_us.load(Ordering::Relaxed),
                total,
            ),
        }
    }
}

/// `GET /metrics`
pub async fn get_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    let metrics = state.metrics.as_ref();
    Json(MetricsResponse {
        app: AppMetrics {
            name: state.service().name().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: metrics.uptime_seconds(),
        },
        requests: metrics.request_metrics(),
        validations: metrics.validation_metrics(),
    })
}

fn push_metric(output: &mut String, name: &str, kind: &str, help: &str, value: impl std::fmt::Display) {
    let _ = write!(
        output,
        "# HELP {name} {help}\n# TYPE {name} {kind}\n{name} {value}\n\n"
    );
}

/// `GET /metrics/prometheus`
pub async fn get_metrics_prometheus(State(state): State<AppState>) -> String {
    let metrics = state.metrics.as_ref();
    let requests = metrics.request_metrics();
    let validations = metrics.validation_metrics();

    let mut output = String::new();
    push_metric(
        &mut output,
        "app_uptime_seconds",
        "counter",
        "Service uptime in seconds",
        metrics.uptime_seconds(),
    );
    push_metric(
        &mut output,
        "http_requests_total",
        "counter",
        "Total HTTP requests",
        requests.total_requests,
    );
    push_metric(
        &mut output,
        "http_requests_success_total",
        "counter",
        "Successful HTTP requests",
        requests.success_count,
    );
    push_metric(
        &mut output,
        "http_requests_client_error_total",
        "counter",
        "Client error HTTP requests",
        requests.client_error_count,
    );
    push_metric(
        &mut output,
        "http_requests_server_error_total",
        "counter",
        "Server error HTTP requests",
        requests.server_error_count,
    );
    push_metric(
        &mut output,
        "http_requests_active",
        "gauge",
        "Current active HTTP requests",
        requests.active_requests,
    );
    push_metric(
        &mut output,
        "http_response_time_avg_ms",
        "gauge",
        "Average response time in milliseconds",
        format!("{:.2}", requests.avg_response_time_ms),
    );

    let _ = write!(
        output,
        "# HELP validations_total Validations by result status\n\
         # TYPE validations_total counter\n"
    );
    for (status, count) in [
        ("pass", validations.pass),
        ("fixed", validations.fixed),
        ("blocked", validations.blocked),
        ("error", validations.error),
        ("failed", validations.failed),
    ] {
        let _ = writeln!(output, "validations_total{{status=\"{status}\"}} {count}");
    }
    output.push('\n');

    push_metric(
        &mut output,
        "validation_time_avg_ms",
        "gauge",
        "Average validation time in milliseconds",
        format!("{:.2}", validations.avg_validation_time_ms),
    );
    output
}
