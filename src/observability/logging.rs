//! Structured logging.
//!
//! # Responsibilities
//! - Build the env filter from `RUST_LOG` or the configured level
//! - Pick the output format (pretty for development, JSON for production)

use tracing::Subscriber;
use tracing_subscriber::{registry::LookupSpan, EnvFilter, Layer};

use crate::config::LogFormat;

/// `RUST_LOG` wins; otherwise `default_directives` with `level` appended as
/// the fallback for everything else.
pub fn env_filter(level: &str, default_directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},{}", level, default_directives)))
}

/// Formatting layer for the configured output format.
pub fn fmt_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().with_target(true).boxed(),
    }
}
