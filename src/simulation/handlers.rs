//! One handler per failure mode.
//!
//! Each handler runs inside its own span (`simulate.<mode>`) and attaches
//! semantic attributes to it; those attributes are observability metadata
//! and do not change the response.

use axum::extract::State;
use axum::http::HeaderMap;
use tracing::{instrument, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::http::middleware::panic::capture_panic;
use crate::http::AppState;
use crate::observability::tracing::inject_context;
use crate::resilience::timeouts::with_deadline;
use crate::simulation::error::SimulationError;
use crate::simulation::outcome::{Measurement, SimulationKind, SimulationOutcome};
use crate::simulation::workload;

type SimulationResult = Result<SimulationOutcome, SimulationError>;

#[derive(Debug)]
struct UserProfile {
    display_name: String,
}

fn find_user_profile(_user_id: u64) -> Option<UserProfile> {
    None
}

/// Dereferences a profile that does not exist, without checking.
///
/// Deliberately unhandled: the panic escapes to the top-level middleware,
/// which owns the 500 response.
#[instrument(name = "simulate.unhandled_exception", skip_all)]
pub async fn unhandled_exception() -> SimulationOutcome {
    tracing::warn!("Looking up a profile that does not exist");
    let profile = find_user_profile(42);
    let name = profile
        .map(|p| p.display_name)
        .expect("user profile 42 is missing: attempted to read display_name of nothing");
    SimulationOutcome::completed(SimulationKind::Success, format!("Hello, {}", name))
}

/// Cancelling an order that already shipped is never allowed.
fn cancel_order(order_id: u64) -> Result<(), SimulationError> {
    Err(SimulationError::Handled(format!(
        "Operation is not valid due to the current state of the object: order {} has already shipped",
        order_id
    )))
}

#[instrument(name = "simulate.handled_exception", skip_all)]
pub async fn handled_exception() -> SimulationResult {
    match cancel_order(1001) {
        Ok(()) => Ok(SimulationOutcome::completed(
            SimulationKind::Success,
            "Order cancelled",
        )),
        Err(e) => {
            tracing::error!(error = %e, "Caught exception while cancelling order");
            let span = Span::current();
            span.set_attribute("exception.type", "HandledException");
            span.set_attribute("exception.message", e.to_string());
            Err(e)
        }
    }
}

#[instrument(name = "simulate.sql_error", skip_all)]
pub async fn sql_error() -> SimulationResult {
    let span = Span::current();
    span.set_attribute("db.system", "postgresql");
    span.set_attribute("db.name", "orders");
    span.set_attribute("db.operation", "SELECT");
    span.set_attribute("db.statement", "SELECT * FROM orders WHERE customer_id = $1");
    span.set_attribute("server.address", "orders-db.internal");
    span.set_attribute("server.port", 5432_i64);

    let err = SimulationError::Database {
        message: "Connection refused: could not connect to orders-db.internal:5432".to_string(),
        system: "postgresql",
        name: "orders",
        operation: "SELECT",
    };
    tracing::error!(error = %err, "Database query failed");
    Err(err)
}

#[instrument(name = "simulate.timeout", skip_all)]
pub async fn timeout(State(state): State<AppState>) -> SimulationOutcome {
    let delay = state.simulation.timeout_delay();
    tracing::info!(delay_ms = delay.as_millis() as u64, "Suspending to provoke a timeout");
    tokio::time::sleep(delay).await;
    SimulationOutcome::completed(
        SimulationKind::Timeout,
        "Request completed after an artificial delay",
    )
    .with_measurement(Measurement::DelayMs(delay.as_millis() as u64))
}

#[instrument(name = "simulate.cpu_spike", skip_all)]
pub async fn cpu_spike(State(state): State<AppState>) -> SimulationOutcome {
    let target = state.simulation.cpu_spike();
    let elapsed = run_blocking(move || workload::burn_cpu(target)).await;
    let duration_ms = elapsed.as_millis() as u64;

    Span::current().set_attribute("simulation.cpu.duration_ms", duration_ms as i64);
    tracing::info!(duration_ms, "CPU spike finished");

    SimulationOutcome::completed(SimulationKind::ResourceSpike, "CPU spike completed")
        .with_measurement(Measurement::DurationMs(duration_ms))
}

#[instrument(name = "simulate.memory_spike", skip_all)]
pub async fn memory_spike(State(state): State<AppState>) -> SimulationOutcome {
    let megabytes = state.simulation.memory_spike_mb;
    let held = run_blocking(move || workload::allocate_and_release(megabytes)).await;

    Span::current().set_attribute("simulation.memory.allocated_mb", held as i64);
    tracing::info!(allocated_mb = held, "Memory spike released");

    SimulationOutcome::completed(
        SimulationKind::ResourceSpike,
        format!("Allocated and released {} MB", held),
    )
    .with_measurement(Measurement::AllocatedMb(held))
}

#[instrument(name = "simulate.dependency_failure", skip_all)]
pub async fn dependency_failure(State(state): State<AppState>) -> SimulationResult {
    let url = state.simulation.dependency_url.clone();
    let deadline = state.simulation.dependency_timeout();

    let span = Span::current();
    span.set_attribute("http.url", url.clone());
    span.set_attribute("peer.service", "inventory-service");

    let mut headers = HeaderMap::new();
    inject_context(&mut headers);

    // The deadline covers DNS, connect and the wait for response headers.
    let call = state.client.get(&url).headers(headers).send();

    match with_deadline(deadline, call).await {
        Ok(Ok(response)) if response.status().is_success() => Ok(SimulationOutcome::completed(
            SimulationKind::Success,
            "Dependency responded",
        )),
        Ok(Ok(response)) => {
            let status = response.status();
            tracing::error!(%status, url = %url, "Dependency returned an error status");
            Err(SimulationError::Dependency(format!(
                "Downstream service returned {}",
                status
            )))
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, url = %url, "Dependency call failed");
            Err(SimulationError::Dependency(format!(
                "Downstream service unreachable: {}",
                e
            )))
        }
        Err(e) => {
            tracing::error!(error = %e, url = %url, "Dependency call timed out");
            Err(SimulationError::Dependency(format!(
                "Downstream service did not answer: {}",
                e
            )))
        }
    }
}

#[instrument(name = "simulate.serialization_error", skip_all)]
pub async fn serialization_error() -> SimulationResult {
    let json = workload::serialize_cyclic_graph().map_err(|e| {
        tracing::error!(error = %e, "Failed to serialize object graph");
        SimulationError::from(e)
    })?;
    Ok(SimulationOutcome::completed(SimulationKind::Success, json))
}

#[instrument(name = "simulate.auth_failure", skip_all)]
pub async fn auth_failure() -> SimulationResult {
    Span::current().set_attribute("enduser.authenticated", false);
    tracing::warn!("Rejecting request without a valid token");
    Err(SimulationError::Unauthorized)
}

#[instrument(name = "simulate.forbidden", skip_all)]
pub async fn forbidden(State(state): State<AppState>) -> SimulationResult {
    let required_role = state.simulation.required_role.clone();
    let span = Span::current();
    span.set_attribute("enduser.role", "User");
    span.set_attribute("enduser.required_role", required_role.clone());
    tracing::warn!(required_role = %required_role, "Caller lacks the required role");
    Err(SimulationError::Forbidden { required_role })
}

#[instrument(name = "simulate.slow_response", skip_all)]
pub async fn slow_response(State(state): State<AppState>) -> SimulationOutcome {
    let delay = state.simulation.slow_response_delay();
    tokio::time::sleep(delay).await;
    SimulationOutcome::completed(SimulationKind::Slow, "Slow response completed")
        .with_measurement(Measurement::DelayMs(delay.as_millis() as u64))
}

/// Run `work` on the blocking pool inside the current span. A panic in the
/// workload resumes here, with its recorded site, so the top-level
/// middleware still sees it.
async fn run_blocking<F, T>(work: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let span = Span::current();
    match tokio::task::spawn_blocking(move || capture_panic(|| span.in_scope(work))).await {
        Ok(Ok(value)) => value,
        Ok(Err(captured)) => captured.resume(),
        Err(e) => std::panic::resume_unwind(e.into_panic()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::middleware::install_panic_capture;
    use futures_util::FutureExt;
    use std::panic::AssertUnwindSafe;

    #[tokio::test]
    async fn test_blocking_panic_resumes_on_caller() {
        install_panic_capture();
        let result = AssertUnwindSafe(run_blocking(|| -> u32 { panic!("blocking workload failed") }))
            .catch_unwind()
            .await;
        let payload = result.unwrap_err();
        assert_eq!(
            payload.downcast_ref::<&str>().copied(),
            Some("blocking workload failed")
        );
    }

    #[tokio::test]
    async fn test_blocking_value_is_returned() {
        assert_eq!(run_blocking(|| 7_u32).await, 7);
    }
}
