//! Long-lived background polling loops that keep the orchestrator's view of
//! the outside world (path announcements, metrics-client descriptors) fresh.
//!
//! Each loop runs independently of the round loop so that ingestion keeps
//! making progress while a round is in flight.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use speedcam_core::Ia;
use tokio::sync::{watch, Mutex};

use crate::fetch::fetch_json;

const INGESTION_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// One Prometheus metrics endpoint this inspector can poll for bandwidth.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MeasurementPoint {
    pub ip: String,
    pub port: u16,
    pub br_id: String,
    pub source_isd_as: Ia,
    pub target_isd_as: Ia,
}

impl MeasurementPoint {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.ip, self.port)
    }
}

/// Every 5 minutes, fetch the list of path-request strings and fold each into
/// the graph via `handle_path_request`. A fetch failure or a malformed
/// request string is logged and the iteration moves on; it never brings the
/// loop down.
pub async fn run_path_request_ingestion(
    client: reqwest::Client,
    url: String,
    graph: Arc<Mutex<speedcam_core::NetworkGraph>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(INGESTION_INTERVAL);
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
        }
        if *shutdown.borrow() {
            return;
        }

        let requests: Vec<String> = match fetch_json(&client, &url).await {
            Ok(requests) => requests,
            Err(err) => {
                tracing::warn!(error = %err, url = %url, "path request fetch failed");
                continue;
            }
        };

        let mut g = graph.lock().await;
        for request in &requests {
            if let Err(err) = g.handle_path_request(request) {
                tracing::warn!(error = %err, request = %request, "dropping malformed path request");
            }
        }
    }
}

/// Every 5 minutes, fetch the current metrics-client descriptor list and
/// atomically replace the shared view of it.
pub async fn run_metrics_client_ingestion(
    client: reqwest::Client,
    url: String,
    points: Arc<Mutex<Vec<MeasurementPoint>>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(INGESTION_INTERVAL);
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
        }
        if *shutdown.borrow() {
            return;
        }

        match fetch_json::<Vec<MeasurementPoint>>(&client, &url).await {
            Ok(fresh) => {
                *points.lock().await = fresh;
            }
            Err(err) => {
                tracing::warn!(error = %err, url = %url, "metrics client list fetch failed");
            }
        }
    }
}
