//! Error simulation service with an OpenTelemetry trace/response contract,
//! plus the client-side trigger layer and global error interceptor.

pub mod config;
pub mod http;
pub mod simulation;
pub mod health;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

// Client side
pub mod client;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
