//! Error simulation catalog.
//!
//! # Data Flow
//! ```text
//! GET {base}/errors/<mode>
//!     → handlers.rs (one stateless handler per failure mode)
//!     → workload.rs (CPU burn, memory spike, cyclic serialization)
//!     → Ok(SimulationOutcome) | Err(SimulationError)
//!     → outcome.rs (status + body by kind)
//! ```
//!
//! # Design Decisions
//! - Handlers return `Result`; local failures never unwind
//! - `unhandled-exception` alone panics, on purpose, and relies on the
//!   top-level panic middleware for its response
//! - Blocking workloads run on the blocking pool so concurrent requests
//!   keep being served

pub mod error;
pub mod handlers;
pub mod outcome;
pub mod workload;

use axum::{routing::get, Router};

use crate::http::AppState;

pub use error::SimulationError;
pub use outcome::{Measurement, SimulationKind, SimulationOutcome};

/// Routes for every failure mode, relative to `/errors`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/unhandled-exception", get(handlers::unhandled_exception))
        .route("/handled-exception", get(handlers::handled_exception))
        .route("/sql-error", get(handlers::sql_error))
        .route("/timeout", get(handlers::timeout))
        .route("/cpu-spike", get(handlers::cpu_spike))
        .route("/memory-spike", get(handlers::memory_spike))
        .route("/dependency-failure", get(handlers::dependency_failure))
        .route("/serialization-error", get(handlers::serialization_error))
        .route("/auth-failure", get(handlers::auth_failure))
        .route("/forbidden", get(handlers::forbidden))
        .route("/slow-response", get(handlers::slow_response))
}
