//! Locally handled simulation failures.

use axum::response::{IntoResponse, Response};

use crate::simulation::outcome::{SimulationKind, SimulationOutcome};

/// Failures a handler catches and turns into a structured response.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// Generic failure caught inside the handler.
    #[error("{0}")]
    Handled(String),

    #[error("{message}")]
    Database {
        message: String,
        system: &'static str,
        name: &'static str,
        operation: &'static str,
    },

    /// Downstream call failed or exceeded its deadline.
    #[error("{0}")]
    Dependency(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid or missing authentication token")]
    Unauthorized,

    #[error("Access denied. Required role: {required_role}")]
    Forbidden { required_role: String },
}

impl SimulationError {
    pub fn kind(&self) -> SimulationKind {
        match self {
            SimulationError::Handled(_)
            | SimulationError::Database { .. }
            | SimulationError::Serialization(_) => SimulationKind::HandledError,
            SimulationError::Dependency(_) => SimulationKind::DependencyError,
            SimulationError::Unauthorized => SimulationKind::AuthError,
            SimulationError::Forbidden { .. } => SimulationKind::ForbiddenError,
        }
    }

    /// Envelope `error` label.
    pub fn label(&self) -> &'static str {
        match self {
            SimulationError::Database { .. } => "DatabaseError",
            SimulationError::Serialization(_) => "SerializationError",
            other => other.kind().default_label(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            SimulationError::Database {
                system,
                name,
                operation,
                ..
            } => Some(serde_json::json!({
                "db.system": system,
                "db.name": name,
                "db.operation": operation,
            })),
            SimulationError::Forbidden { required_role } => {
                Some(serde_json::json!({ "requiredRole": required_role }))
            }
            _ => None,
        }
    }
}

impl From<SimulationError> for SimulationOutcome {
    fn from(err: SimulationError) -> Self {
        let outcome = SimulationOutcome::failed(err.kind(), err.label(), err.to_string());
        match err.details() {
            Some(details) => outcome.with_details(details),
            None => outcome,
        }
    }
}

impl IntoResponse for SimulationError {
    fn into_response(self) -> Response {
        SimulationOutcome::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_error_responses() {
        let response = SimulationError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = SimulationError::Forbidden {
            required_role: "Admin".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = SimulationError::Dependency("unreachable".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = SimulationError::Handled("caught".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_outcome_conversion() {
        let outcome = SimulationOutcome::from(SimulationError::Forbidden {
            required_role: "Admin".into(),
        });
        let envelope = outcome.envelope().unwrap();
        assert_eq!(envelope.error, "Forbidden");
        assert!(envelope.message.contains("Required role: Admin"));
        assert_eq!(envelope.details.unwrap()["requiredRole"], "Admin");
    }

    #[test]
    fn test_database_error_carries_db_details() {
        let err = SimulationError::Database {
            message: "connection refused".into(),
            system: "postgresql",
            name: "orders",
            operation: "SELECT",
        };
        assert_eq!(err.kind(), SimulationKind::HandledError);
        let envelope = SimulationOutcome::from(err).envelope().unwrap();
        assert_eq!(envelope.error, "DatabaseError");
        assert_eq!(envelope.details.unwrap()["db.system"], "postgresql");
    }

    #[test]
    fn test_serialization_label() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = SimulationError::from(source);
        assert_eq!(err.label(), "SerializationError");
        assert!(err.to_string().starts_with("Serialization failed"));
    }
}
