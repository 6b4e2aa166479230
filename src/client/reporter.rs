//! Reported error events and their sinks.

use std::fmt;

use crate::observability::tracing::current_trace_id;

/// Which global channel captured the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorSource {
    UncaughtException,
    UnhandledRejection,
    ResourceLoad,
}

impl fmt::Display for ErrorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorSource::UncaughtException => "uncaught-exception",
            ErrorSource::UnhandledRejection => "unhandled-rejection",
            ErrorSource::ResourceLoad => "resource-load",
        })
    }
}

/// One reported error occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEvent {
    pub source: ErrorSource,
    pub error_type: String,
    pub message: String,
    /// Failing resource URL or code location, when known.
    pub target: Option<String>,
    pub trace_id: Option<String>,
}

impl ErrorEvent {
    pub fn new(source: ErrorSource, error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source,
            error_type: error_type.into(),
            message: message.into(),
            target: None,
            trace_id: current_trace_id(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// Sink for error events.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, event: &ErrorEvent);
}

/// Emits each event as an errored `client.error` span, exported with the
/// rest of the trace when OpenTelemetry is enabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, event: &ErrorEvent) {
        let span = tracing::error_span!(
            "client.error",
            otel.status_code = "ERROR",
            otel.status_message = %event.message,
            error.source = %event.source,
            exception.type = %event.error_type,
            exception.message = %event.message,
            error.target = event.target.as_deref().unwrap_or(""),
        );
        let _guard = span.enter();
        tracing::error!(
            source = %event.source,
            error_type = %event.error_type,
            trace_id = event.trace_id.as_deref().unwrap_or("none"),
            "{}",
            event.message
        );
    }
}
