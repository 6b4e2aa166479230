//! Configuration loading from disk and the runtime environment.

use std::fs;
use std::path::Path;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file without validating it.
fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

impl AppConfig {
    /// Load the file at `path` (or defaults), layer the process environment
    /// on top and validate the result.
    pub fn from_env_or_file(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => read_config(path)?,
            None => AppConfig::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    /// Apply runtime overrides. `lookup` resolves a variable name to its value.
    ///
    /// Unparsable values are logged and ignored; validation still runs on the
    /// merged result.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SIM_BIND_ADDRESS") {
            self.listener.bind_address = v;
        }
        if let Some(v) = lookup("SIM_BASE_PATH") {
            self.listener.base_path = v;
        }
        if let Some(v) = lookup("SIM_LOG_LEVEL") {
            self.observability.log_level = v;
        }
        if let Some(v) = lookup("SIM_LOG_FORMAT") {
            match v.parse() {
                Ok(format) => self.observability.log_format = format,
                Err(e) => tracing::warn!(value = %v, error = %e, "Ignoring SIM_LOG_FORMAT"),
            }
        }
        if let Some(v) = lookup("SIM_METRICS_ENABLED") {
            self.observability.metrics_enabled = parse_flag(&v);
        }
        if let Some(v) = lookup("SIM_TRACE_ENABLED") {
            self.observability.tracing.enabled = parse_flag(&v);
        }
        if let Some(v) = lookup("SIM_TRACE_SAMPLE_RATE") {
            match v.parse::<f64>() {
                Ok(rate) => self.observability.tracing.sample_rate = rate,
                Err(e) => tracing::warn!(value = %v, error = %e, "Ignoring SIM_TRACE_SAMPLE_RATE"),
            }
        }
        if let Some(v) = lookup("OTEL_SERVICE_NAME") {
            self.observability.tracing.service_name = v;
        }
        if let Some(v) = lookup("OTEL_EXPORTER_OTLP_ENDPOINT") {
            self.observability.tracing.otlp_endpoint = v;
        }
        if let Some(v) = lookup("SIM_API_BASE_URL") {
            self.client.api_base_url = v;
        }
        if let Some(v) = lookup("SIM_COLLECTOR_URL") {
            self.client.collector_url = v;
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_overrides_resolve_endpoints_at_runtime() {
        let mut config = AppConfig::default();
        config.apply_overrides(lookup_from(&[
            ("SIM_API_BASE_URL", "http://api.internal:8080/api"),
            ("SIM_COLLECTOR_URL", "http://collector:4318"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://jaeger:4317"),
            ("SIM_TRACE_ENABLED", "true"),
            ("SIM_TRACE_SAMPLE_RATE", "0.25"),
        ]));

        assert_eq!(config.client.api_base_url, "http://api.internal:8080/api");
        assert_eq!(config.client.collector_url, "http://collector:4318");
        assert_eq!(config.observability.tracing.otlp_endpoint, "http://jaeger:4317");
        assert!(config.observability.tracing.enabled);
        assert_eq!(config.observability.tracing.sample_rate, 0.25);
    }

    #[test]
    fn test_bad_override_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides(lookup_from(&[
            ("SIM_LOG_FORMAT", "xml"),
            ("SIM_TRACE_SAMPLE_RATE", "lots"),
        ]));
        assert_eq!(config.observability.log_format, crate::config::LogFormat::Pretty);
        assert_eq!(config.observability.tracing.sample_rate, 1.0);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("nope"));
    }

    #[test]
    fn test_load_config_rejects_invalid_file() {
        let path = std::env::temp_dir().join(format!("sim-config-{}.toml", uuid::Uuid::new_v4()));
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[listener]\nbase_path = \"api/\"").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().starts_with("Validation failed"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
