//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and URLs parse
//! - Validate value ranges (durations > 0, sample rate in [0, 1])
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::AppConfig;

/// Largest memory spike the simulator agrees to allocate.
pub const MAX_MEMORY_SPIKE_MB: usize = 4096;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = config.listener.bind_address.parse::<SocketAddr>() {
        errors.push(ValidationError::new("listener.bind_address", e.to_string()));
    }

    let base = &config.listener.base_path;
    if !base.starts_with('/') {
        errors.push(ValidationError::new("listener.base_path", "must start with '/'"));
    } else if base.len() > 1 && base.ends_with('/') {
        errors.push(ValidationError::new("listener.base_path", "must not end with '/'"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    }

    let sim = &config.simulation;
    let longest_simulation_ms = [
        sim.timeout_delay_ms,
        sim.slow_response_delay_ms,
        sim.cpu_spike_ms,
        sim.dependency_timeout_ms,
    ]
    .into_iter()
    .max()
    .unwrap_or(0);
    if config.timeouts.request_secs > 0
        && config.timeouts.request_secs.saturating_mul(1000) <= longest_simulation_ms
    {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!(
                "must exceed the longest simulated delay ({} ms)",
                longest_simulation_ms
            ),
        ));
    }
    for (field, value) in [
        ("simulation.timeout_delay_ms", sim.timeout_delay_ms),
        ("simulation.slow_response_delay_ms", sim.slow_response_delay_ms),
        ("simulation.cpu_spike_ms", sim.cpu_spike_ms),
        ("simulation.dependency_timeout_ms", sim.dependency_timeout_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    if sim.memory_spike_mb == 0 || sim.memory_spike_mb > MAX_MEMORY_SPIKE_MB {
        errors.push(ValidationError::new(
            "simulation.memory_spike_mb",
            format!("must be between 1 and {}", MAX_MEMORY_SPIKE_MB),
        ));
    }

    if sim.required_role.trim().is_empty() {
        errors.push(ValidationError::new("simulation.required_role", "must not be empty"));
    }

    let obs = &config.observability;
    if obs.metrics_enabled {
        if let Err(e) = obs.metrics_address.parse::<SocketAddr>() {
            errors.push(ValidationError::new("observability.metrics_address", e.to_string()));
        }
    }

    if !(0.0..=1.0).contains(&obs.tracing.sample_rate) {
        errors.push(ValidationError::new(
            "observability.tracing.sample_rate",
            "must be within [0.0, 1.0]",
        ));
    }

    for (field, value) in [
        ("simulation.dependency_url", &sim.dependency_url),
        ("observability.tracing.otlp_endpoint", &obs.tracing.otlp_endpoint),
        ("client.api_base_url", &config.client.api_base_url),
        ("client.collector_url", &config.client.collector_url),
    ] {
        if let Err(e) = url::Url::parse(value) {
            errors.push(ValidationError::new(field, e.to_string()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
