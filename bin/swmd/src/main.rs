//! ---
//! swm_section: "01-core-functionality"
//! swm_subsection: "binary"
//! swm_type: "source"
//! swm_scope: "code"
//! swm_description: "Binary entrypoint for the SmartWaste fleet daemon."
//! swm_version: "v0.0.0-prealpha"
//! swm_owner: "tbd"
//! ---
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use swm_common::config::AppConfig;
use swm_common::logging::init_tracing;
use swm_common::metrics::{new_registry, spawn_http_server};
use swm_core::{FleetController, FleetMetrics, SimulationDriver};
use swm_sim::bootstrap_fleet;
use tokio::signal;
use tracing::{error, info, warn};

const DEFAULT_CONFIG_PATH: &str = "configs/swmd.toml";
const DRIVER_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Parser)]
#[command(author, version, about = "SmartWaste fleet daemon", long_about = None)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Override the simulation random seed")]
    seed: Option<u64>,

    #[arg(long, value_name = "MS", help = "Override the simulation tick interval")]
    tick_interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Drive the telemetry simulation until interrupted")]
    Run,
    #[command(about = "Apply a fixed number of ticks and print the fleet report as JSON")]
    Summary {
        #[arg(long, default_value_t = 10)]
        ticks: u64,
        #[arg(long, value_name = "FILE", help = "Write the report to FILE instead of stdout")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = match &cli.config {
        Some(path) => AppConfig::load_required(path)?,
        None => AppConfig::load_with_source(&[PathBuf::from(DEFAULT_CONFIG_PATH)])?,
    };
    let mut config = loaded.config;
    if let Some(seed) = cli.seed {
        config.fleet.simulation.random_seed = seed;
    }
    if let Some(ms) = cli.tick_interval_ms {
        config.fleet.simulation.tick_interval = Duration::from_millis(ms);
    }
    config.validate()?;

    init_tracing("swmd", &config.logging)?;
    match &loaded.source {
        Some(path) => info!(config_path = %path.display(), "configuration loaded"),
        None => info!("no configuration file found; running with defaults"),
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_daemon(config).await,
        Commands::Summary { ticks, output } => run_summary(&config, ticks, output),
    }
}

fn build_fleet(config: &AppConfig) -> Result<FleetController> {
    let mut rng = StdRng::seed_from_u64(config.fleet.simulation.random_seed);
    bootstrap_fleet(&config.fleet, &mut rng)
}

async fn run_daemon(config: AppConfig) -> Result<()> {
    let mut fleet = build_fleet(&config)?;

    let metrics_server = if config.metrics.enabled {
        let registry = new_registry();
        fleet = fleet.with_metrics(FleetMetrics::new(registry.clone())?);
        let server = spawn_http_server(registry, config.metrics.listen)?;
        info!(address = %server.addr(), "metrics exporter enabled");
        Some(server)
    } else {
        info!("metrics exporter disabled by configuration");
        None
    };

    let fleet = Arc::new(fleet);
    let summary = fleet.snapshot().summary();
    info!(
        containers = summary.total,
        critical = summary.critical,
        average_fill = summary.average_fill_level,
        "fleet ready"
    );

    let driver = SimulationDriver::from_config(fleet.clone(), &config.fleet.simulation).spawn();
    info!("daemon running; waiting for termination signal");

    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut poll = tokio::time::interval(DRIVER_POLL_INTERVAL);
    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result.context("failed to listen for ctrl-c")?;
                info!("ctrl-c received; shutting down");
                break;
            }
            _ = poll.tick() => {
                if driver.is_finished() {
                    warn!("simulation driver exited on its own; shutting down");
                    break;
                }
            }
        }
    }

    let outcome = driver.shutdown().await?;
    let summary = fleet.snapshot().summary();
    info!(
        ticks = outcome.ticks,
        critical = summary.critical,
        average_fill = summary.average_fill_level,
        "fleet stopped"
    );

    if let Some(server) = metrics_server {
        server.shutdown().await?;
    }

    if let Some(err) = outcome.failure {
        error!(error = %err, "daemon stopping after simulation failure");
        return Err(err.into());
    }
    Ok(())
}

fn run_summary(config: &AppConfig, ticks: u64, output: Option<PathBuf>) -> Result<()> {
    let fleet = build_fleet(config)?;
    let mut rng = StdRng::seed_from_u64(config.fleet.simulation.random_seed);
    for _ in 0..ticks {
        fleet.tick(&mut rng)?;
    }
    let report = fleet.snapshot().report();
    let rendered = serde_json::to_string_pretty(&report)?;
    match output {
        Some(path) => {
            fs::write(&path, rendered)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            info!(path = %path.display(), ticks, "fleet report written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
