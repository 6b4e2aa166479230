//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! simulator. All types derive Serde traits for deserialization from config
//! files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the error simulator.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address, base path).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Knobs for the failure-mode simulations.
    pub simulation: SimulationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Settings used by the client trigger layer.
    pub client: ClientConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Path prefix every route is nested under.
    pub base_path: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            base_path: "/api".to_string(),
        }
    }
}

/// Timeout configuration for the HTTP surface.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        // Must stay above the 30s timeout simulation.
        Self { request_secs: 60 }
    }
}

/// Durations and sizes used by the simulated failure modes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// How long the timeout simulation suspends.
    pub timeout_delay_ms: u64,

    /// How long the slow-response simulation suspends.
    pub slow_response_delay_ms: u64,

    /// Wall-clock duration of the CPU spike.
    pub cpu_spike_ms: u64,

    /// Size of the memory spike allocation.
    pub memory_spike_mb: usize,

    /// Downstream address the dependency-failure simulation calls.
    pub dependency_url: String,

    /// Upper bound on the dependency call.
    pub dependency_timeout_ms: u64,

    /// Role reported as missing by the forbidden simulation.
    pub required_role: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            timeout_delay_ms: 30_000,
            slow_response_delay_ms: 5_000,
            cpu_spike_ms: 3_000,
            memory_spike_mb: 500,
            dependency_url: "http://unreachable-dependency.invalid:9999/api/data".to_string(),
            dependency_timeout_ms: 5_000,
            required_role: "Admin".to_string(),
        }
    }
}

impl SimulationConfig {
    pub fn timeout_delay(&self) -> Duration {
        Duration::from_millis(self.timeout_delay_ms)
    }

    pub fn slow_response_delay(&self) -> Duration {
        Duration::from_millis(self.slow_response_delay_ms)
    }

    pub fn cpu_spike(&self) -> Duration {
        Duration::from_millis(self.cpu_spike_ms)
    }

    pub fn dependency_timeout(&self) -> Duration {
        Duration::from_millis(self.dependency_timeout_ms)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output for development.
    #[default]
    Pretty,
    /// One JSON object per line for log aggregation.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// OpenTelemetry export settings.
    pub tracing: TracingConfig,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
            tracing: TracingConfig::default(),
        }
    }
}

/// OpenTelemetry trace export configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Export spans to a collector.
    pub enabled: bool,

    /// `service.name` resource attribute.
    pub service_name: String,

    /// OTLP gRPC endpoint of the collector.
    pub otlp_endpoint: String,

    /// Sampling ratio (0.0 to 1.0) for root spans.
    pub sample_rate: f64,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            service_name: "error-simulator".to_string(),
            otlp_endpoint: "http://localhost:4317".to_string(),
            sample_rate: 1.0,
        }
    }
}

/// Client trigger layer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the simulator API, including the base path.
    pub api_base_url: String,

    /// OTLP endpoint for client-side spans.
    pub collector_url: String,

    /// Client-side request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            collector_url: "http://localhost:4317".to_string(),
            request_timeout_secs: 45,
        }
    }
}
