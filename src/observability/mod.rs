//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!     → tracing.rs (spans with trace IDs, exported over OTLP)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Trace collector (e.g., Jaeger via OTLP)
//! ```
//!
//! # Design Decisions
//! - One `tracing` subscriber feeds both logs and OpenTelemetry spans
//! - Trace export is optional; handlers behave identically without it
//! - Trace IDs are the correlation IDs returned to callers

pub mod logging;
pub mod metrics;
pub mod tracing;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ObservabilityConfig;

/// Errors raised while installing the telemetry pipeline.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("failed to build span exporter: {0}")]
    Exporter(#[from] opentelemetry::trace::TraceError),

    #[error("failed to install subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),

    #[error("failed to install metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// Install the global subscriber: env filter, log formatter and, when
/// enabled, the OpenTelemetry bridge.
///
/// `default_directives` is used when neither `RUST_LOG` nor a per-crate level
/// applies (binaries pass their own crate name).
pub fn init(config: &ObservabilityConfig, default_directives: &str) -> Result<(), TelemetryError> {
    let otel_layer = if config.tracing.enabled {
        let tracer = self::tracing::build_tracer(&config.tracing)?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(logging::env_filter(&config.log_level, default_directives))
        .with(logging::fmt_layer(config.log_format))
        .with(otel_layer)
        .try_init()?;

    ::tracing::info!(
        log_level = %config.log_level,
        log_format = ?config.log_format,
        trace_export = config.tracing.enabled,
        "Telemetry initialized"
    );
    Ok(())
}
