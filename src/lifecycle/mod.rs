//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! startup.rs:   config → telemetry → metrics → bind → serve
//! shutdown.rs:  trigger → stop accepting → drain in-flight simulations
//! signals.rs:   SIGTERM/SIGINT → graceful shutdown
//! ```
//!
//! In-flight delay simulations are not cancelled; the drain waits for them.
//! Spans are flushed after the server stops.

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
