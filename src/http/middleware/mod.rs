//! Tower/axum middleware owned by the HTTP subsystem.

pub mod panic;

pub use panic::{catch_panic, install_panic_capture};
