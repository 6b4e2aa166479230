use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use error_simulator::client::{
    install_global, ActionCatalog, ActionClass, ActionState, ApiClient, Renderer, TracingReporter,
    TriggerLayer,
};
use error_simulator::config::{LogFormat, ObservabilityConfig, TracingConfig};
use error_simulator::observability;

#[derive(Parser)]
#[command(name = "sim-cli")]
#[command(about = "Trigger client faults and server failure modes", long_about = None)]
struct Cli {
    #[arg(short, long, env = "SIM_API_BASE_URL", default_value = "http://localhost:8080/api")]
    api_url: String,

    /// OTLP endpoint client spans are exported to with `--trace`.
    #[arg(short, long, env = "SIM_COLLECTOR_URL", default_value = "http://localhost:4317")]
    collector_url: String,

    #[arg(long)]
    trace: bool,

    #[arg(long, default_value_t = 45)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available actions
    List,
    /// Run actions by id, in order
    Run { ids: Vec<String> },
    /// Run every action, optionally only one class
    RunAll {
        #[arg(long, value_enum)]
        class: Option<ClassArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ClassArg {
    Client,
    Server,
}

impl From<ClassArg> for ActionClass {
    fn from(class: ClassArg) -> Self {
        match class {
            ClassArg::Client => ActionClass::Client,
            ClassArg::Server => ActionClass::Server,
        }
    }
}

/// Prints a line whenever an action changes state.
#[derive(Default)]
struct TerminalRenderer {
    seen: Vec<(&'static str, ActionState)>,
}

impl Renderer for TerminalRenderer {
    fn refresh(&mut self, catalog: &ActionCatalog) {
        for action in catalog.iter() {
            let state = action.state();
            let changed = match self.seen.iter_mut().find(|(id, _)| *id == action.id()) {
                Some(entry) if entry.1 == state => false,
                Some(entry) => {
                    entry.1 = state;
                    true
                }
                None => {
                    self.seen.push((action.id(), state));
                    state != ActionState::Idle
                }
            };
            if changed {
                match (state, action.last_response()) {
                    (ActionState::Loading, _) | (_, None) => {
                        println!("[{:<7}] {}", state, action.id())
                    }
                    (_, Some(summary)) => println!("[{:<7}] {}: {}", state, action.id(), summary),
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let telemetry = ObservabilityConfig {
        log_level: "warn".to_string(),
        log_format: LogFormat::Pretty,
        tracing: TracingConfig {
            enabled: cli.trace,
            service_name: "error-simulator-client".to_string(),
            otlp_endpoint: cli.collector_url.clone(),
            ..TracingConfig::default()
        },
        ..ObservabilityConfig::default()
    };
    observability::init(&telemetry, "sim_cli=info,error_simulator=info")?;

    let interceptor = install_global(Arc::new(TracingReporter));
    let api = ApiClient::new(&cli.api_url, Duration::from_secs(cli.timeout_secs))?;
    let mut layer = TriggerLayer::new(api, interceptor, TerminalRenderer::default());

    let ids: Vec<String> = match cli.command {
        Commands::List => {
            for action in layer.catalog().iter() {
                println!(
                    "{:<22} {:<7} {}",
                    action.id(),
                    format!("{:?}", action.class()).to_lowercase(),
                    action.description()
                );
            }
            Vec::new()
        }
        Commands::Run { ids } => ids,
        Commands::RunAll { class } => layer
            .catalog()
            .iter()
            .filter(|a| class.map_or(true, |c| a.class() == ActionClass::from(c)))
            .map(|a| a.id().to_string())
            .collect(),
    };

    let mut failed = false;
    for id in &ids {
        if let Err(e) = layer.invoke(id).await {
            eprintln!("Error: {}", e);
            failed = true;
        }
    }

    if cli.trace {
        observability::tracing::shutdown_tracing();
    }
    if failed {
        std::process::exit(2);
    }
    Ok(())
}
