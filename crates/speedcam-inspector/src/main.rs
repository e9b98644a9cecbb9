//! SpeedCam Inspector
//!
//! Polls AS path announcements and border-router metrics for a SCION-style
//! inter-domain network, runs the SpeedCam selection algorithm each round,
//! and writes per-round bandwidth snapshots to disk.

mod error;
mod fetch;
mod ingestion;
mod orchestrator;
mod sink;
mod worker;

use std::sync::Arc;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use speedcam_core::graph::NetworkGraph;
use tokio::sync::{watch, Mutex};
use tracing_subscriber::EnvFilter;

use orchestrator::{run_orchestrator_loop, OrchestratorState};

/// SpeedCam bandwidth inspector daemon.
#[derive(Parser, Debug)]
#[command(name = "speedcam-inspector", about = "SpeedCam bandwidth inspector")]
struct Cli {
    /// Path to a TOML configuration file. Missing fields fall back to
    /// documented defaults.
    #[arg(long)]
    config: Option<String>,

    /// URL returning a JSON array of path-request strings.
    #[arg(long)]
    path_request_url: String,

    /// URL returning a JSON array of measurement-point descriptors.
    #[arg(long)]
    metrics_client_url: String,

    /// Override the configured result directory.
    #[arg(long)]
    result_dir: Option<String>,

    /// Enable debug-level logging.
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            speedcam_core::config::SpeedCamConfig::from_toml_str(&raw)?
        }
        None => speedcam_core::config::SpeedCamConfig::from_toml_str("")?,
    };
    if let Some(result_dir) = cli.result_dir.clone() {
        config.result_dir = Some(result_dir);
    }

    tracing::info!(
        episodes = config.episodes,
        scale_type = ?config.scale_type,
        interval_strategy = ?config.interval_strategy,
        result_dir = ?config.result_dir,
        "speedcam-inspector starting"
    );

    let client = fetch::build_client()?;

    let graph = Arc::new(Mutex::new(NetworkGraph::new(config.episodes)));
    let points = Arc::new(Mutex::new(Vec::new()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let path_request_handle = tokio::spawn(ingestion::run_path_request_ingestion(
        client.clone(),
        cli.path_request_url.clone(),
        graph.clone(),
        shutdown_rx.clone(),
    ));
    let metrics_client_handle = tokio::spawn(ingestion::run_metrics_client_ingestion(
        client.clone(),
        cli.metrics_client_url.clone(),
        points.clone(),
        shutdown_rx.clone(),
    ));

    let state = Arc::new(OrchestratorState {
        graph,
        points,
        config,
        client,
    });
    let rng = StdRng::from_os_rng();
    let orchestrator_handle = tokio::spawn(run_orchestrator_loop(state, rng, shutdown_rx.clone()));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received SIGINT, shutting down");
            let _ = shutdown_tx.send(true);
        }
        result = orchestrator_handle => {
            if let Err(e) = result {
                tracing::error!("orchestrator task failed: {e}");
            }
        }
    }

    let _ = path_request_handle.await;
    let _ = metrics_client_handle.await;

    tracing::info!("speedcam-inspector stopped");
    Ok(())
}
