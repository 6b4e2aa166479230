//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (runtime environment overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → cloned into the server state and the client layer
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so an empty file (or no file) is a valid config
//! - Endpoints (API base URL, collector URL) come from the environment at run
//!   time, never from build-time constants
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AppConfig;
pub use schema::ClientConfig;
pub use schema::ListenerConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::SimulationConfig;
pub use schema::TimeoutConfig;
pub use schema::TracingConfig;
