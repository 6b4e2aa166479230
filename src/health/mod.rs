//! Liveness probe.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::observability::tracing::current_trace_id;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub trace_id: Option<String>,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
            trace_id: current_trace_id(),
        }
    }
}

#[tracing::instrument(name = "health", skip_all)]
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::healthy())
}
