//! Core graph, scoring, and finite-difference primitives for the SpeedCam bandwidth
//! inspector.
//!
//! This crate has no I/O and no async runtime dependency: everything here is
//! deterministic given its inputs, which keeps the hard parts of the algorithm
//! (selection, history weighting, finite differences, interval scheduling)
//! unit-testable without a network or a wall clock.

pub mod bytes;
pub mod config;
pub mod error;
pub mod graph;
pub mod history;
pub mod ia;
pub mod interval;
pub mod measurement;
pub mod metrics_text;
pub mod node;
pub mod scale;
pub mod selector;
pub mod snapshot;

pub use bytes::ByteSize;
pub use config::SpeedCamConfig;
pub use error::Error;
pub use graph::NetworkGraph;
pub use ia::Ia;
pub use node::NodeInfo;
