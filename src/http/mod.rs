//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, per-request span, trace context)
//!     → middleware/panic.rs (top-level catch for panicking handlers)
//!     → simulation / health handlers
//!     → response.rs (uniform error envelope)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::ErrorEnvelope;
pub use server::{AppState, HttpServer};
