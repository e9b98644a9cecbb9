//! The JSON-serializable record of one completed inspection round.

use std::collections::HashMap;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SpeedCamConfig;
use crate::graph::NetworkGraph;
use crate::ia::Ia;
use crate::measurement::RateSample;
use crate::selector::{score_node, SelectorWeights};

/// One node's state at the moment a snapshot was taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNodeSnapshot {
    pub neighbors: Vec<Ia>,
    pub candidate_score: f64,
    pub capacity_bytes: u64,
    pub degree: u32,
    pub activities: Vec<ActivitySnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySnapshot {
    pub start: DateTime<Utc>,
    pub duration_secs: i64,
    pub bandwidth_bytes: u64,
}

/// One completed inspection round, ready to be written out as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionSnapshot {
    pub start: DateTime<Utc>,
    pub duration_secs: i64,
    /// One entry per speed cam that measured this round, keyed by the
    /// neighbor it measured.
    pub speed_cam_results: Vec<HashMap<Ia, Vec<RateSample>>>,
    pub graph: HashMap<Ia, GraphNodeSnapshot>,
    pub config: SpeedCamConfig,
}

/// Build a snapshot of `graph` as it stood at `start`, scored with `weights`.
pub fn build_snapshot(
    graph: &NetworkGraph,
    speed_cam_results: Vec<HashMap<Ia, Vec<RateSample>>>,
    start: DateTime<Utc>,
    duration: ChronoDuration,
    weights: SelectorWeights,
    config: SpeedCamConfig,
) -> InspectionSnapshot {
    let mut nodes = HashMap::new();
    for node in graph.nodes() {
        let neighbors: Vec<Ia> = graph.neighbors(node.ia).collect();
        let activities = node
            .activities
            .iter_present()
            .map(|a| ActivitySnapshot {
                start: a.start,
                duration_secs: a.duration.num_seconds(),
                bandwidth_bytes: a.bandwidth.bytes(),
            })
            .collect();

        nodes.insert(
            node.ia,
            GraphNodeSnapshot {
                neighbors,
                candidate_score: score_node(node, weights),
                capacity_bytes: node.capacity.bytes(),
                degree: node.degree,
                activities,
            },
        );
    }

    InspectionSnapshot {
        start,
        duration_secs: duration.num_seconds(),
        speed_cam_results,
        graph: nodes,
        config,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytes::ByteSize;

    #[test]
    fn snapshot_captures_topology_and_scores() {
        let mut g = NetworkGraph::new(6);
        g.handle_path_request("1-1 1>1 1-5").unwrap();
        g.add_capacity("1-1".parse().unwrap(), ByteSize::from_gb(1))
            .unwrap();

        let weights = SelectorWeights {
            degree: 1.0,
            capacity: 1.0,
            success: 1.0,
            activity: 1.0,
        };
        let snap = build_snapshot(
            &g,
            Vec::new(),
            Utc::now(),
            ChronoDuration::seconds(30),
            weights,
            SpeedCamConfig::default(),
        );

        assert_eq!(snap.graph.len(), 2);
        let a1 = &snap.graph[&"1-1".parse::<Ia>().unwrap()];
        assert_eq!(a1.degree, 1);
        assert_eq!(a1.neighbors, vec!["1-5".parse::<Ia>().unwrap()]);
        assert!(a1.candidate_score > 0.0);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let g = NetworkGraph::new(6);
        let weights = SelectorWeights {
            degree: 1.0,
            capacity: 1.0,
            success: 1.0,
            activity: 1.0,
        };
        let snap = build_snapshot(
            &g,
            Vec::new(),
            Utc::now(),
            ChronoDuration::seconds(1),
            weights,
            SpeedCamConfig::default(),
        );
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"config\""));
    }
}
