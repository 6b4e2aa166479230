//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Downstream call (dependency-failure simulation):
//!     → timeouts.rs (bounded wait, error on expiry)
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline
//! - No retries: the simulations exist to expose failures, not mask them

pub mod timeouts;

pub use timeouts::{with_deadline, DeadlineExceeded};
