//! Request metrics middleware

use std::{sync::Arc, time::Instant};

use axum::{extract::Request, extract::State, middleware::Next, response::Response};

use crate::handlers::metrics::MetricsCollector;

/// Count every request and its response class in `metrics`
pub async fn track_requests(
    State(metrics): State<Arc<MetricsCollector>>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    metrics.request_start();
    let response = next.run(request).await;
    let elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    metrics.request_end(elapsed_us, response.status().as_u16());
    response
}
