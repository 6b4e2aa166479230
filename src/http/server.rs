//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers under the configured base path
//! - Wire up middleware (request ID, tracing, CORS, timeout, panic catch)
//! - Bind server to listener and stop on shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    http::{header, HeaderName, Method, StatusCode, Uri},
    middleware,
    response::Response,
    routing::get,
    BoxError, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::timeout::{error::Elapsed, TimeoutLayer};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, SimulationConfig};
use crate::health;
use crate::http::middleware::{catch_panic, install_panic_capture};
use crate::http::request::{make_request_span, record_response, X_REQUEST_ID};
use crate::http::response::error_response;
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::tracing::{TRACEPARENT_HEADER, TRACESTATE_HEADER};
use crate::simulation;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub simulation: Arc<SimulationConfig>,
    /// Client used for downstream calls.
    pub client: reqwest::Client,
}

/// HTTP server for the error simulator.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        install_panic_capture();

        let state = AppState {
            simulation: Arc::new(config.simulation.clone()),
            client: reqwest::Client::new(),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let api = Router::new()
            .route("/health", get(health::health))
            .nest("/errors", simulation::routes());

        let base_path = config.listener.base_path.as_str();
        let app = if base_path == "/" {
            Router::new().merge(api)
        } else {
            Router::new().nest(base_path, api)
        };

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                HeaderName::from_static(TRACEPARENT_HEADER),
                HeaderName::from_static(TRACESTATE_HEADER),
            ])
            .expose_headers([HeaderName::from_static(X_REQUEST_ID)]);

        // Outermost first: the request span must be current while the panic
        // catcher runs so the envelope carries the trace ID.
        let layers = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(make_request_span)
                    .on_response(record_response),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(cors)
            .layer(HandleErrorLayer::new(request_timed_out))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn(catch_panic));

        app.fallback(not_found).with_state(state).layer(layers)
    }

    /// Run the server until `shutdown` fires or the process is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            base_path = %self.config.listener.base_path,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => {
                        tracing::info!("Shutdown requested");
                    }
                    _ = shutdown_signal() => {}
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for driving the service without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

async fn not_found(method: Method, uri: Uri) -> Response {
    tracing::debug!(method = %method, path = %uri.path(), "No route matched");
    error_response(
        StatusCode::NOT_FOUND,
        "NotFound",
        format!("No route for {} {}", method, uri.path()),
    )
}

/// Turns an expired request deadline into the standard envelope.
async fn request_timed_out(err: BoxError) -> Response {
    if err.is::<Elapsed>() {
        tracing::warn!("Request exceeded the server deadline");
        error_response(
            StatusCode::REQUEST_TIMEOUT,
            "RequestTimeout",
            "Request exceeded the server deadline",
        )
    } else {
        tracing::error!(error = %err, "Unhandled middleware error");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "InternalServerError", err.to_string())
    }
}
