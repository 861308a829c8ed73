//! Prometheus metrics: HTTP middleware, business counters and the `/metrics` handler.

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Middleware to record HTTP request metrics.
///
/// Records the following metrics:
/// - `http_requests_total`: Counter with labels (method, path, status)
/// - `http_request_duration_seconds`: Histogram with labels (method, path)
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = method_to_str(req.method());
    // Route templates keep label cardinality bounded.
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    counter!(
        "http_requests_total",
        "method" => method,
        "path" => path.clone(),
        "status" => status
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path
    )
    .record(start.elapsed().as_secs_f64());

    response
}

fn method_to_str(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        Method::PATCH => "PATCH",
        Method::HEAD => "HEAD",
        Method::OPTIONS => "OPTIONS",
        _ => "OTHER",
    }
}

/// Outcome label for `registrations_total`: confirmed, waitlisted, or a refusal code.
pub fn record_registration(outcome: &str) {
    counter!("registrations_total", "outcome" => outcome.to_string()).increment(1);
}

pub fn record_cancellation(was_confirmed: bool, promoted: bool) {
    counter!(
        "registration_cancellations_total",
        "was_confirmed" => was_confirmed.to_string()
    )
    .increment(1);
    if promoted {
        counter!("waitlist_promotions_total").increment(1);
    }
}

pub fn record_email(email_type: &str, status: &str) {
    counter!(
        "emails_total",
        "type" => email_type.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Webhook events by type and what processing did with them.
pub fn record_webhook_event(event_type: &str, outcome: &str) {
    counter!(
        "donation_webhook_events_total",
        "type" => event_type.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

pub fn record_donation(frequency: &str, amount_minor: i64) {
    counter!("donations_total", "frequency" => frequency.to_string()).increment(1);
    counter!("donations_amount_minor_total", "frequency" => frequency.to_string())
        .increment(amount_minor.max(0) as u64);
}

/// Handler for /metrics endpoint that returns Prometheus text format.
pub async fn metrics_handler() -> impl IntoResponse {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            "Metrics not initialized".to_string(),
        ),
    }
}

/// Install the global Prometheus recorder. Called once from `main`;
/// later calls are no-ops.
pub fn init_metrics() -> Result<(), BuildError> {
    if PROMETHEUS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets(&[0.001, 0.005, 0.01, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0])?
        .install_recorder()?;

    let _ = PROMETHEUS_HANDLE.set(handle);
    Ok(())
}
