//! The per-round control loop: select cams, measure, aggregate, persist,
//! schedule the next round.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;
use speedcam_core::bytes::ByteSize;
use speedcam_core::config::SpeedCamConfig;
use speedcam_core::graph::NetworkGraph;
use speedcam_core::ia::Ia;
use speedcam_core::measurement::RateSample;
use speedcam_core::selector::{select_usable_speed_cams, SelectorWeights};
use tokio::sync::{watch, Mutex};

use crate::ingestion::MeasurementPoint;
use crate::sink;

const ROUND_DURATION_SECS: i64 = 30;
const POLL_INTERVAL: StdDuration = StdDuration::from_secs(5);

fn round_duration() -> ChronoDuration {
    ChronoDuration::seconds(ROUND_DURATION_SECS)
}

/// Shared, long-lived state the orchestrator and the ingestion tasks both
/// touch. The graph is read and written only from the orchestrator's own
/// loop — ingestion tasks hold the same mutex only for the duration of a
/// single `handle_path_request` call.
pub struct OrchestratorState {
    pub graph: Arc<Mutex<NetworkGraph>>,
    pub points: Arc<Mutex<Vec<MeasurementPoint>>>,
    pub config: SpeedCamConfig,
    pub client: reqwest::Client,
}

fn selector_weights(config: &SpeedCamConfig) -> SelectorWeights {
    SelectorWeights {
        degree: config.weight_degree,
        capacity: config.weight_capacity,
        success: config.weight_success,
        activity: config.weight_activity,
    }
}

/// Run exactly one `StartInspection` round. Returns `None` if the graph was
/// empty (nothing to do yet).
pub async fn run_round(state: &OrchestratorState, rng: &mut impl Rng) -> Option<PathBuf> {
    let start = Utc::now();

    let mut clients_by_source: HashMap<Ia, Vec<MeasurementPoint>> = HashMap::new();
    for point in state.points.lock().await.iter() {
        clients_by_source
            .entry(point.source_isd_as)
            .or_default()
            .push(point.clone());
    }

    let (usable_ias, missing): (Vec<Ia>, Vec<Ia>) = {
        let graph = state.graph.lock().await;
        if graph.size() == 0 {
            tracing::info!("graph is empty, skipping round");
            return None;
        }
        let mut usable = Vec::new();
        let mut missing = Vec::new();
        for ia in graph.ias() {
            if clients_by_source.contains_key(&ia) {
                usable.push(ia);
            } else {
                missing.push(ia);
            }
        }
        (usable, missing)
    };
    if !missing.is_empty() {
        tracing::info!(count = missing.len(), "graph nodes without client info this round");
    }

    let selected = {
        let graph = state.graph.lock().await;
        let usable_nodes: Vec<&speedcam_core::NodeInfo> = usable_ias
            .iter()
            .filter_map(|ia| graph.node(*ia))
            .collect();
        match select_usable_speed_cams(
            &usable_nodes,
            selector_weights(&state.config),
            state.config.scale_type,
            state.config.scale_param,
            state.config.speed_cam_diff,
            rng,
        ) {
            Ok(selected) => selected,
            Err(err) => {
                tracing::error!(error = %err, "speed cam selection failed fatally");
                return None;
            }
        }
    };
    tracing::debug!(count = selected.len(), "selected speed cams for this round");

    let mut tasks = Vec::with_capacity(selected.len());
    for source in &selected {
        let points = clients_by_source.get(source).cloned().unwrap_or_default();
        let client = state.client.clone();
        let source = *source;
        tasks.push(tokio::spawn(async move {
            (
                source,
                crate::worker::run_worker(client, source, points, round_duration(), POLL_INTERVAL).await,
            )
        }));
    }

    let mut speed_cam_results: Vec<HashMap<Ia, Vec<RateSample>>> = Vec::with_capacity(tasks.len());
    let mut bandwidth_per_node: HashMap<Ia, f64> = HashMap::new();
    let mut observed_edges: HashMap<Ia, HashSet<Ia>> = HashMap::new();

    for task in tasks {
        let (source, per_neighbor) = match task.await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(error = %err, "measurement worker task panicked");
                continue;
            }
        };
        for (neighbor, samples) in &per_neighbor {
            observed_edges.entry(source).or_default().insert(*neighbor);
            observed_edges.entry(*neighbor).or_default().insert(source);

            let count = samples.len() as f64;
            if count == 0.0 {
                continue;
            }
            for sample in samples {
                *bandwidth_per_node.entry(source).or_insert(0.0) += sample.rate_out / count;
                *bandwidth_per_node.entry(*neighbor).or_insert(0.0) += sample.rate_in / count;
            }
        }
        speed_cam_results.push(per_neighbor);
    }

    {
        let mut graph = state.graph.lock().await;
        for ia in bandwidth_per_node.keys() {
            if !graph.contains(*ia) {
                let _ = graph.add_as(*ia);
            }
        }
        for (ia, counterparts) in &observed_edges {
            for counterpart in counterparts {
                if graph.contains(*ia) && graph.contains(*counterpart) {
                    let _ = graph.connect_idempotent(*ia, *counterpart);
                }
            }
        }
        for (ia, bandwidth) in &bandwidth_per_node {
            let bytes = ByteSize(bandwidth.round().max(0.0) as u64);
            if let Err(err) = graph.add_activity(*ia, start, round_duration(), bytes) {
                tracing::warn!(error = %err, ia = %ia, "failed to record round activity");
            }
        }
    }

    let snapshot_path = if let Some(dir) = state.config.result_dir.as_ref() {
        let graph = state.graph.lock().await;
        let snapshot = speedcam_core::snapshot::build_snapshot(
            &graph,
            speed_cam_results,
            start,
            round_duration(),
            selector_weights(&state.config),
            state.config.clone(),
        );
        match sink::write_snapshot(std::path::Path::new(dir), state.config.max_results, &snapshot) {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::error!(error = %err, "failed to write inspection snapshot");
                None
            }
        }
    } else {
        None
    };

    snapshot_path
}

/// Run rounds forever until `shutdown` is signaled, sleeping between rounds
/// according to the configured interval strategy.
pub async fn run_orchestrator_loop(
    state: Arc<OrchestratorState>,
    mut rng: impl Rng,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            return;
        }

        run_round(&state, &mut rng).await;

        let activities = collect_activity_windows(&state).await;
        let wait = match speedcam_core::interval::wait_time(
            state.config.interval_strategy,
            state.config.interval_wait_min,
            state.config.interval_wait_max,
            &activities,
            Utc::now(),
            &mut rng,
        ) {
            Ok(wait) => wait,
            Err(err) => {
                tracing::error!(error = %err, "interval strategy is fatally misconfigured");
                return;
            }
        };
        let wait_std = wait.to_std().unwrap_or(StdDuration::from_secs(1));

        tokio::select! {
            _ = tokio::time::sleep(wait_std) => {}
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
        }
    }
}

async fn collect_activity_windows(
    state: &OrchestratorState,
) -> Vec<speedcam_core::interval::ActivityWindow> {
    let graph = state.graph.lock().await;
    graph
        .nodes()
        .flat_map(|node| {
            node.activities.iter_present().map(|a| speedcam_core::interval::ActivityWindow {
                start: a.start,
                duration: a.duration,
                bandwidth: a.bandwidth,
            })
        })
        .collect()
}
