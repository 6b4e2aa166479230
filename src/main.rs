//! Error simulator
//!
//! Serves one endpoint per failure mode so traces, logs and error reports
//! can be checked end to end.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌────────────────────────────────────────────────────┐
//!                        │                  ERROR SIMULATOR                    │
//!                        │                                                     │
//!   GET /api/errors/*    │  ┌──────────┐   ┌────────────┐   ┌──────────────┐  │
//!   ─────────────────────┼─▶│   http   │──▶│ catch_panic│──▶│  simulation  │  │
//!   (traceparent)        │  │  layers  │   │ middleware │   │   handlers   │  │
//!                        │  └──────────┘   └────────────┘   └──────┬───────┘  │
//!                        │                                          │          │
//!   JSON + traceId       │  ┌──────────┐                   ┌───────▼──────┐  │
//!   ◀────────────────────┼──│ envelope │◀──────────────────│   outcome /  │  │
//!                        │  │ response │                   │    error     │  │
//!                        │  └──────────┘                   └──────────────┘  │
//!                        │                                                     │
//!                        │  config · observability · resilience · lifecycle    │
//!                        └────────────────────────────────────────────────────┘
//! ```
//!
//! Spans are exported over OTLP when `SIM_TRACE_ENABLED` is set.

use std::path::PathBuf;

use clap::Parser;

use error_simulator::config::AppConfig;
use error_simulator::lifecycle::startup;

#[derive(Parser)]
#[command(name = "error-simulator")]
#[command(about = "Failure-mode simulation service", long_about = None)]
struct Args {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long, env = "SIM_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = AppConfig::from_env_or_file(args.config.as_deref())?;
    startup::run(config).await
}
