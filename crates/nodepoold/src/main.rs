//! nodepoold — the nodepool daemon.
//!
//! Loads the controller config and a cluster snapshot, then drives the
//! scale-up core once per scan cycle:
//! - Node group state (one per configured group)
//! - In-memory cloud gateways and node API
//! - Untaint event counter + Prometheus exposition
//!
//! # Usage
//!
//! ```text
//! nodepoold plan --config nodepool.toml --cluster cluster.json
//! nodepoold run  --config nodepool.toml --cluster cluster.json
//! ```

mod simulation;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::watch;
use tracing::info;

use nodepool_core::ControllerConfig;

use crate::simulation::{Simulation, load_snapshot};

#[derive(Parser)]
#[command(name = "nodepoold", about = "nodepool capacity controller daemon")]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single scan cycle and print what it did.
    Plan {
        /// Controller config (TOML).
        #[arg(long, default_value = "nodepool.toml")]
        config: PathBuf,

        /// Cluster snapshot (JSON).
        #[arg(long)]
        cluster: PathBuf,

        /// Force dry mode for every group.
        #[arg(long)]
        dry_run: bool,
    },
    /// Re-read the snapshot and scan every `scan_interval` until Ctrl-C.
    Run {
        /// Controller config (TOML).
        #[arg(long, default_value = "nodepool.toml")]
        config: PathBuf,

        /// Cluster snapshot (JSON), re-read every cycle.
        #[arg(long)]
        cluster: PathBuf,

        /// Force dry mode for every group.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Plan {
            config,
            cluster,
            dry_run,
        } => plan(config, cluster, dry_run),
        Command::Run {
            config,
            cluster,
            dry_run,
        } => run(config, cluster, dry_run).await,
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,nodepoold=debug,nodepool=debug"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

fn load_config(path: &Path, dry_run: bool) -> anyhow::Result<ControllerConfig> {
    let mut config = ControllerConfig::from_file(path)
        .with_context(|| format!("loading controller config from {}", path.display()))?;
    config.dry_mode |= dry_run;
    info!(
        path = %path.display(),
        groups = config.node_groups.len(),
        dry_mode = config.dry_mode,
        "controller config loaded"
    );
    Ok(config)
}

fn plan(config_path: PathBuf, cluster_path: PathBuf, dry_run: bool) -> anyhow::Result<()> {
    let config = load_config(&config_path, dry_run)?;
    let snapshot = load_snapshot(&cluster_path)?;

    let mut sim = Simulation::new(&config, &snapshot);
    let reports = sim.run_cycle(&snapshot);

    println!("{}", serde_json::to_string_pretty(&reports)?);
    print!("{}", sim.render_metrics());
    Ok(())
}

async fn run(config_path: PathBuf, cluster_path: PathBuf, dry_run: bool) -> anyhow::Result<()> {
    info!("nodepool daemon starting");

    let config = load_config(&config_path, dry_run)?;
    let interval = config.scan_interval()?;
    let snapshot = load_snapshot(&cluster_path)?;
    let mut sim = Simulation::new(&config, &snapshot);

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    sim.run(&cluster_path, interval, shutdown_rx).await;

    print!("{}", sim.render_metrics());
    info!("nodepool daemon stopped");
    Ok(())
}
