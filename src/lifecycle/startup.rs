//! Startup orchestration.
//!
//! Config is already loaded and validated by the caller; this brings the
//! remaining subsystems up in dependency order and serves until shutdown.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::observability::{self, metrics};

/// Run the service to completion.
pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    observability::init(&config.observability, "error_simulator=debug,tower_http=info")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        base_path = %config.listener.base_path,
        request_timeout_secs = config.timeouts.request_secs,
        "error-simulator starting"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config.clone());
    let result = server.run(listener, shutdown.subscribe()).await;

    if config.observability.tracing.enabled {
        observability::tracing::shutdown_tracing();
    }
    result?;

    tracing::info!("Shutdown complete");
    Ok(())
}
