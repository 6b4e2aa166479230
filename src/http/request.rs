//! Request handling.
//!
//! # Responsibilities
//! - Assign a unique request ID (UUID v4) as early as possible
//! - Open the per-request span, continuing the caller's trace when a
//!   `traceparent` header is present
//! - Record the response status on that span
//!
//! The span declares the fields later filled in by the envelope and panic
//! paths (`otel.status_code`, `error.type`); recording an undeclared field
//! is silently dropped by `tracing`.

use std::time::Duration;

use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use tracing::{field::Empty, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::observability::metrics;
use crate::observability::tracing::extract_context;

pub const X_REQUEST_ID: &str = "x-request-id";

/// `make_span_with` callback for the trace layer.
pub fn make_request_span<B>(request: &Request<B>) -> Span {
    let method = request.method();
    let path = request.uri().path();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str)
        .unwrap_or("unmatched");
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    let span = tracing::info_span!(
        "http.request",
        otel.name = %format!("{} {}", method, route),
        otel.kind = "server",
        otel.status_code = Empty,
        otel.status_message = Empty,
        http.request.method = %method,
        http.route = %route,
        url.path = %path,
        http.response.status_code = Empty,
        request_id = %request_id,
        error.type = Empty,
    );
    span.set_parent(extract_context(request.headers()));
    span
}

/// `on_response` callback for the trace layer.
pub fn record_response<B>(response: &Response<B>, latency: Duration, span: &Span) {
    let status = response.status().as_u16();
    span.record("http.response.status_code", status);
    metrics::record_request(status, latency);
    tracing::debug!(
        status,
        latency_ms = latency.as_millis() as u64,
        "Response sent"
    );
}
