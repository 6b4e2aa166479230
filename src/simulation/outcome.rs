//! The single tagged result type every simulation resolves to.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::response::ErrorEnvelope;
use crate::observability::metrics;
use crate::observability::tracing::current_trace_id;

/// Closed set of outcomes a simulation can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimulationKind {
    Success,
    HandledError,
    UnhandledError,
    DependencyError,
    AuthError,
    ForbiddenError,
    Timeout,
    Slow,
    ResourceSpike,
}

impl SimulationKind {
    /// Documented HTTP status for this kind.
    pub fn status(self) -> StatusCode {
        match self {
            SimulationKind::Success
            | SimulationKind::Timeout
            | SimulationKind::Slow
            | SimulationKind::ResourceSpike => StatusCode::OK,
            SimulationKind::AuthError => StatusCode::UNAUTHORIZED,
            SimulationKind::ForbiddenError => StatusCode::FORBIDDEN,
            SimulationKind::DependencyError => StatusCode::BAD_GATEWAY,
            SimulationKind::HandledError | SimulationKind::UnhandledError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn is_error(self) -> bool {
        !self.status().is_success()
    }

    /// Envelope `error` label used unless the failure names a narrower one.
    pub fn default_label(self) -> &'static str {
        match self {
            SimulationKind::HandledError => "HandledException",
            SimulationKind::UnhandledError => "InternalServerError",
            SimulationKind::DependencyError => "DependencyFailure",
            SimulationKind::AuthError => "Unauthorized",
            SimulationKind::ForbiddenError => "Forbidden",
            SimulationKind::Success
            | SimulationKind::Timeout
            | SimulationKind::Slow
            | SimulationKind::ResourceSpike => "None",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SimulationKind::Success => "success",
            SimulationKind::HandledError => "handled-error",
            SimulationKind::UnhandledError => "unhandled-error",
            SimulationKind::DependencyError => "dependency-error",
            SimulationKind::AuthError => "auth-error",
            SimulationKind::ForbiddenError => "forbidden-error",
            SimulationKind::Timeout => "timeout",
            SimulationKind::Slow => "slow",
            SimulationKind::ResourceSpike => "resource-spike",
        }
    }
}

/// Figure reported by delay and resource simulations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Measurement {
    DurationMs(u64),
    AllocatedMb(usize),
    DelayMs(u64),
}

/// Result of one simulation: kind, message, correlation ID and, depending
/// on the kind, a measurement or an error label.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub kind: SimulationKind,
    pub message: String,
    pub trace_id: Option<String>,
    pub measurement: Option<Measurement>,
    pub error_label: Option<&'static str>,
    pub details: Option<serde_json::Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportBody<'a> {
    message: &'a str,
    #[serde(flatten)]
    measurement: Option<Measurement>,
    trace_id: Option<&'a str>,
}

impl SimulationOutcome {
    /// A non-error outcome, correlated with the active trace.
    pub fn completed(kind: SimulationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            trace_id: current_trace_id(),
            measurement: None,
            error_label: None,
            details: None,
        }
    }

    /// An error outcome with an explicit envelope label.
    pub fn failed(kind: SimulationKind, label: &'static str, message: impl Into<String>) -> Self {
        Self {
            error_label: Some(label),
            ..Self::completed(kind, message)
        }
    }

    pub fn with_measurement(mut self, measurement: Measurement) -> Self {
        self.measurement = Some(measurement);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    /// Envelope for error kinds, `None` otherwise.
    pub fn envelope(&self) -> Option<ErrorEnvelope> {
        if !self.kind.is_error() {
            return None;
        }
        Some(ErrorEnvelope {
            error: self
                .error_label
                .unwrap_or_else(|| self.kind.default_label())
                .to_string(),
            message: self.message.clone(),
            trace_id: self.trace_id.clone(),
            details: self.details.clone(),
        })
    }
}

impl IntoResponse for SimulationOutcome {
    fn into_response(self) -> Response {
        let status = self.status();
        metrics::record_simulation(self.kind.as_str(), status.as_u16());

        match self.envelope() {
            Some(envelope) => {
                tracing::warn!(
                    kind = self.kind.as_str(),
                    error = %envelope.error,
                    status = status.as_u16(),
                    message = %envelope.message,
                    "Simulation produced an error response"
                );
                envelope.into_response_with(status)
            }
            None => {
                let body = ReportBody {
                    message: &self.message,
                    measurement: self.measurement,
                    trace_id: self.trace_id.as_deref(),
                };
                (status, Json(body)).into_response()
            }
        }
    }
}
