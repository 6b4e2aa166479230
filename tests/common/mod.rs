#![allow(dead_code)]
//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Once;
use std::time::Duration;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::TracerProvider;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use error_simulator::config::AppConfig;
use error_simulator::{HttpServer, Shutdown};

static TELEMETRY: Once = Once::new();

/// Install a subscriber with the OpenTelemetry bridge and no exporter, so
/// spans carry real trace IDs without a collector.
pub fn init_tracing() {
    TELEMETRY.call_once(|| {
        let provider = TracerProvider::builder().build();
        let tracer = provider.tracer("integration-tests");
        opentelemetry::global::set_tracer_provider(provider);

        let _ = tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::new("error_simulator=debug"))
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .try_init();
    });
}

/// Config with short delays, suitable for tests.
pub fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.simulation.timeout_delay_ms = 300;
    config.simulation.slow_response_delay_ms = 200;
    config.simulation.memory_spike_mb = 8;
    config.simulation.dependency_url = "http://127.0.0.1:1/api/data".to_string();
    config
}

/// A running simulator bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestServer {
    pub async fn start(config: AppConfig) -> Self {
        init_tracing();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let server = HttpServer::new(config);
        let receiver = shutdown.subscribe();
        tokio::spawn(async move {
            server.run(listener, receiver).await.unwrap();
        });

        Self { addr, shutdown }
    }

    /// Base URL including the `/api` prefix.
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url(), path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// A dependency that accepts connections and never answers. Returns the
/// URL to call.
pub async fn start_silent_dependency() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{}/api/data", addr)
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap()
}

pub fn is_trace_id(value: &serde_json::Value) -> bool {
    value
        .as_str()
        .map(|s| s.len() == 32 && s.chars().all(|c| c.is_ascii_hexdigit()) && s != "0".repeat(32))
        .unwrap_or(false)
}
