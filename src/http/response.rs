//! Response shaping.
//!
//! # Responsibilities
//! - Define the uniform error envelope `{error, message, traceId}`
//! - Mark the active span as failed whenever an envelope is produced
//!
//! # Design Decisions
//! - `traceId` is always present in the body, `null` when tracing is off
//! - Every error body produced by a handler goes through here

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::Span;

use crate::observability::tracing::current_trace_id;

/// Uniform error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    /// Error kind label (e.g. "Unauthorized").
    pub error: String,
    pub message: String,
    pub trace_id: Option<String>,
    /// Extra simulated context, only present for some kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorEnvelope {
    /// Build an envelope carrying the active trace ID.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            trace_id: current_trace_id(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Render with `status`, flagging the active span as an error.
    pub fn into_response_with(self, status: StatusCode) -> Response {
        mark_span_error(&Span::current(), &self.error, &self.message);
        (status, Json(self)).into_response()
    }
}

/// Record an error outcome on `span` (`otel.status_code = ERROR`).
pub fn mark_span_error(span: &Span, error_type: &str, message: &str) {
    span.record("otel.status_code", "ERROR");
    span.record("otel.status_message", message);
    span.record("error.type", error_type);
}

/// Shorthand for `ErrorEnvelope::new(error, message).into_response_with(status)`.
pub fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> Response {
    ErrorEnvelope::new(error, message).into_response_with(status)
}
