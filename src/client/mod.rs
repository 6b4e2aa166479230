//! Client trigger layer and global error interceptor.
//!
//! # Data Flow
//! ```text
//! sim-cli run <id>
//!     → trigger.rs (idle → loading → success | error, refresh after each)
//!         → api.rs (GET {base}/..., traceparent injected)      [server actions]
//!         → faults.rs (local fault injection)                  [client actions]
//!             → interceptor.rs (panic hook | rejection | resource | handle_error)
//!                 → reporter.rs (one ErrorEvent per occurrence)
//! ```
//!
//! # Design Decisions
//! - Server-call failures are handled by the trigger layer itself
//! - Client faults are never caught by the action; each reaches the
//!   interceptor through exactly one channel
//! - The interceptor is process-wide and registered once

pub mod api;
pub mod catalog;
pub mod faults;
pub mod interceptor;
pub mod reporter;
pub mod trigger;

pub use api::{ApiClient, ClientError, ServerReply};
pub use catalog::{ActionCatalog, ActionClass, ActionDescriptor, ActionState, ActionTarget};
pub use faults::{ClientFault, FaultResult};
pub use interceptor::{install_global, ErrorInterceptor, ResourceKind, ResourceLoadFailure};
pub use reporter::{ErrorEvent, ErrorReporter, ErrorSource, TracingReporter};
pub use trigger::{Renderer, TriggerLayer, UnknownAction};
