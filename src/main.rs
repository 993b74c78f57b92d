//! Market simulation entry point.
//!
//! Wires configuration into a [`simulation::Controller`], optionally
//! fast-forwards history, then either serves the REST/SSE API or runs a
//! fixed number of ticks headless.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::{create_app, ServerConfig, ServerState};
use simulation::{Controller, SimConfig};

/// Tick-driven multi-agent market simulation.
#[derive(Parser, Debug)]
#[command(name = "agora-market", version)]
struct Args {
    /// Path to a JSON configuration file (defaults used when absent).
    #[arg(long, env = "AGORA_CONFIG")]
    config: Option<PathBuf>,

    /// Host to bind the API server to.
    #[arg(long, env = "AGORA_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to bind the API server to.
    #[arg(long, env = "AGORA_PORT", default_value_t = 8080)]
    port: u16,

    /// Override the master random seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Populate this many days of history before serving.
    #[arg(long)]
    populate_days: Option<u32>,

    /// Run without the API server for a fixed number of ticks.
    #[arg(long)]
    headless: bool,

    /// Tick count for headless mode.
    #[arg(long, default_value_t = 10_000)]
    ticks: u64,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SimConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            let config: SimConfig = serde_json::from_str(&text)
                .with_context(|| format!("parsing config file {}", path.display()))?;
            Ok(config)
        }
        None => Ok(SimConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = load_config(args.config.as_ref())?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let controller = Controller::new(config).context("initializing simulation")?;

    if let Some(days) = args.populate_days {
        info!(days, "populating history before start");
        let start_date = controller.config().start_date;
        controller
            .populate(days, &start_date)
            .context("starting populate")?;
        while controller.is_populating() {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        info!(tick = controller.current_tick(), "populate finished");
    }

    if args.headless {
        info!(ticks = args.ticks, "running headless");
        let mut remaining = args.ticks;
        while remaining > 0 {
            let batch = remaining.min(1_000) as u32;
            controller.step(batch).context("stepping simulation")?;
            remaining -= batch as u64;
        }
        let metrics = controller.metrics();
        info!(
            ticks = metrics.total_ticks,
            trades = metrics.total_trades,
            orders = metrics.total_orders,
            "headless run complete"
        );
        return Ok(());
    }

    controller.start();

    let server_config = ServerConfig {
        host: args.host,
        port: args.port,
    };
    let state = ServerState::new(controller.clone());
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(server_config.bind_addr())
        .await
        .with_context(|| format!("binding {}", server_config.bind_addr()))?;
    info!(addr = %server_config.bind_addr(), "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("serving API")?;

    controller.stop();
    Ok(())
}
