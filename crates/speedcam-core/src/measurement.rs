//! Finite-difference rate computation over raw counter samples.
//!
//! A speed cam polls a neighbor's Prometheus endpoint repeatedly over its
//! measurement window and collects monotonically-increasing byte counters.
//! `differentiate` turns consecutive pairs of those counters into per-second
//! rate samples — the actual bandwidth signal the selector and node history
//! care about.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bytes::ByteSize;
use crate::error::Error;
use crate::ia::Ia;

/// One raw counter sample taken from a neighbor's metrics endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSample {
    pub timestamp: DateTime<Utc>,
    pub bandwidth_in: ByteSize,
    pub bandwidth_out: ByteSize,
    pub source: Ia,
    pub neighbor: Ia,
}

/// One finite-difference rate, in bytes/second, timestamped at the midpoint
/// of the two raw samples it was computed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSample {
    pub timestamp: DateTime<Utc>,
    pub rate_in: f64,
    pub rate_out: f64,
    pub source: Ia,
    pub neighbor: Ia,
}

/// Turn `n` raw samples into `n - 1` rate samples.
///
/// A counter that appears to go backwards between two samples (a reset, or a
/// restarted `border_input_bytes_total` on the neighbor) is clamped to zero
/// for that interval rather than underflowing. A non-positive
/// interval between two samples is a data-shape error — the clock went
/// backwards or two polls landed on the same second — and fails the whole
/// point rather than producing a division by zero or a negative rate.
///
/// Requires at least 2 samples; fewer is `Error::DataShape`.
pub fn differentiate(samples: &[RawSample]) -> Result<Vec<RateSample>, Error> {
    if samples.len() <= 1 {
        return Err(Error::DataShape(format!(
            "too few samples to differentiate (needs 2 or more): {}",
            samples.len()
        )));
    }

    samples
        .windows(2)
        .map(|pair| differentiate_pair(&pair[0], &pair[1]))
        .collect()
}

fn differentiate_pair(start: &RawSample, end: &RawSample) -> Result<RateSample, Error> {
    let delta_t = end.timestamp.timestamp() - start.timestamp.timestamp();
    if delta_t <= 0 {
        return Err(Error::DataShape(format!(
            "non-positive interval ({delta_t}s) between samples at {} and {}",
            start.timestamp, end.timestamp
        )));
    }

    let delta_out = end.bandwidth_out.saturating_sub(start.bandwidth_out);
    let delta_in = end.bandwidth_in.saturating_sub(start.bandwidth_in);

    let midpoint_unix = (end.timestamp.timestamp() + start.timestamp.timestamp()) / 2;
    let timestamp = DateTime::<Utc>::from_timestamp(midpoint_unix, 0).unwrap_or(start.timestamp);

    Ok(RateSample {
        timestamp,
        rate_in: delta_in.as_f64() / delta_t as f64,
        rate_out: delta_out.as_f64() / delta_t as f64,
        source: start.source,
        neighbor: start.neighbor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(secs: i64, bw_in: u64, bw_out: u64) -> RawSample {
        RawSample {
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            bandwidth_in: ByteSize(bw_in),
            bandwidth_out: ByteSize(bw_out),
            source: "1-1".parse().unwrap(),
            neighbor: "1-5".parse().unwrap(),
        }
    }

    #[test]
    fn rejects_fewer_than_two_samples() {
        assert!(differentiate(&[]).is_err());
        assert!(differentiate(&[sample(0, 0, 0)]).is_err());
    }

    #[test]
    fn computes_rates_across_consecutive_pairs() {
        // consecutive counter pairs differentiate into per-second rates
        let samples = vec![
            sample(0, 1_000, 2_000),
            sample(10, 1_500, 2_800),
            sample(20, 2_100, 3_100),
        ];
        let diffed = differentiate(&samples).unwrap();
        assert_eq!(diffed.len(), 2);
        assert!((diffed[0].rate_in - 50.0).abs() < 1e-9);
        assert!((diffed[0].rate_out - 80.0).abs() < 1e-9);
        assert!((diffed[1].rate_in - 60.0).abs() < 1e-9);
        assert!((diffed[1].rate_out - 30.0).abs() < 1e-9);
    }

    #[test]
    fn clamps_counter_reset_to_zero_instead_of_underflowing() {
        let samples = vec![sample(0, 5_000, 5_000), sample(10, 100, 100)];
        let diffed = differentiate(&samples).unwrap();
        assert_eq!(diffed[0].rate_in, 0.0);
        assert_eq!(diffed[0].rate_out, 0.0);
    }

    #[test]
    fn timestamp_is_midpoint_of_the_pair() {
        let samples = vec![sample(0, 0, 0), sample(10, 0, 0)];
        let diffed = differentiate(&samples).unwrap();
        assert_eq!(diffed[0].timestamp.timestamp(), 5);
    }

    #[test]
    fn non_positive_interval_is_a_data_shape_error() {
        let samples = vec![sample(10, 0, 0), sample(10, 0, 0)];
        assert!(matches!(differentiate(&samples), Err(Error::DataShape(_))));
    }
}
