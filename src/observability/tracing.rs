//! Distributed tracing support.
//!
//! # Responsibilities
//! - Build the OpenTelemetry tracer provider and OTLP exporter
//! - Extract trace context from incoming requests
//! - Inject trace context into outgoing requests
//! - Look up the active trace ID for correlation
//!
//! # Design Decisions
//! - Optional: export disabled by default, lookups return `None` then
//! - W3C Trace Context headers (`traceparent`, `tracestate`)
//! - Spans are `tracing` spans; `tracing-opentelemetry` bridges them

use std::time::Duration;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};
use opentelemetry::trace::{TraceContextExt, TraceError, TracerProvider as _};
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{Config, RandomIdGenerator, Sampler, Tracer, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::config::TracingConfig;

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";

/// Build a tracer exporting batches over OTLP/gRPC and register its provider
/// globally so [`shutdown_tracing`] can flush it.
pub fn build_tracer(config: &TracingConfig) -> Result<Tracer, TraceError> {
    let resource = Resource::new(vec![
        KeyValue::new(SERVICE_NAME, config.service_name.clone()),
        KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
    ]);

    // ParentBased keeps the client's sampling decision for propagated traces.
    let sampler = Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(config.sample_rate)));

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(&config.otlp_endpoint)
        .with_timeout(Duration::from_secs(10))
        .build_span_exporter()?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_config(
            Config::default()
                .with_sampler(sampler)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource),
        )
        .build();

    let tracer = provider.tracer(config.service_name.clone());
    opentelemetry::global::set_tracer_provider(provider);

    tracing::info!(
        endpoint = %config.otlp_endpoint,
        sample_rate = config.sample_rate,
        service_name = %config.service_name,
        "OpenTelemetry exporter configured"
    );
    Ok(tracer)
}

/// Flush pending spans and shut the provider down.
pub fn shutdown_tracing() {
    tracing::info!("Shutting down OpenTelemetry tracer provider");
    opentelemetry::global::shutdown_tracer_provider();
}

/// Trace ID of the active span as 32 lowercase hex digits.
///
/// `None` when no valid OpenTelemetry context is active, which is the case
/// whenever trace export is disabled.
pub fn current_trace_id() -> Option<String> {
    let context = tracing::Span::current().context();
    let span = context.span();
    let span_context = span.span_context();
    span_context
        .is_valid()
        .then(|| span_context.trace_id().to_string())
}

/// Extract the W3C trace context carried by `headers`.
///
/// Returns an empty context (a new trace will start) when none is present.
pub fn extract_context(headers: &HeaderMap) -> opentelemetry::Context {
    TraceContextPropagator::new().extract(&HeaderExtractor(headers))
}

/// Inject the active span's context into outgoing `headers`.
pub fn inject_context(headers: &mut HeaderMap) {
    let context = tracing::Span::current().context();
    TraceContextPropagator::new().inject_context(&context, &mut HeaderInjector(headers));
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

struct HeaderInjector<'a>(&'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            self.0.insert(name, value);
        }
    }
}
