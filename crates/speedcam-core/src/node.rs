//! Per-AS information: topology facts plus bounded episode history.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

use crate::bytes::ByteSize;
use crate::history::BoundedHistory;
use crate::ia::Ia;

/// `chrono::Duration` has no built-in serde support, so it's stored as whole
/// seconds on the wire and rebuilt on load.
mod duration_secs {
    use chrono::Duration as ChronoDuration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &ChronoDuration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(duration.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<ChronoDuration, D::Error> {
        let secs = i64::deserialize(d)?;
        Ok(ChronoDuration::seconds(secs))
    }
}

/// One completed round's bandwidth contribution for a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub start: DateTime<Utc>,
    #[serde(with = "duration_secs")]
    pub duration: ChronoDuration,
    pub bandwidth: ByteSize,
}

/// Everything the selector and the graph need to know about one AS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    pub ia: Ia,
    pub degree: u32,
    pub capacity: ByteSize,
    pub successes: BoundedHistory<bool>,
    pub activities: BoundedHistory<ActivityRecord>,
}

impl NodeInfo {
    pub fn new(ia: Ia, episodes: usize) -> Self {
        Self {
            ia,
            degree: 0,
            capacity: ByteSize::ZERO,
            successes: BoundedHistory::new(episodes),
            activities: BoundedHistory::new(episodes),
        }
    }

    /// Harmonic-weighted success rate: the newest slot counts as `1/1`, the next as
    /// `1/2`, and so on — so a success further in the past is worth less.
    ///
    /// Deliberately left unnormalized: the result sits in `[0, H_episodes]`, not
    /// `[0, 1]`. The selector's success weight absorbs the scale; this function
    /// never rescales it away.
    pub fn success_rate(&self) -> f64 {
        self.successes
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                let hit = matches!(slot, Some(true));
                if hit {
                    1.0 / (i as f64 + 1.0)
                } else {
                    0.0
                }
            })
            .sum()
    }

    /// Activity rate: observed bandwidth over configured capacity, across every
    /// *present* activity slot.
    ///
    /// Capacity is summed once per present activity slot, not once per node —
    /// this double-counts capacity when more than one activity record is
    /// present. Preserved exactly as the original algorithm computes it; not
    /// silently "fixed" here.
    pub fn activity_rate(&self) -> f64 {
        let mut bandwidth_sum = ByteSize::ZERO;
        let mut capacity_sum = ByteSize::ZERO;
        let mut present = 0u64;
        for record in self.activities.iter_present() {
            bandwidth_sum += record.bandwidth;
            capacity_sum += self.capacity;
            present += 1;
        }
        let _ = present;
        if capacity_sum.bytes() == 0 {
            return 0.0;
        }
        bandwidth_sum.as_f64() / capacity_sum.as_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(episodes: usize) -> NodeInfo {
        NodeInfo::new("1-7".parse().unwrap(), episodes)
    }

    #[test]
    fn success_rate_defaults_to_zero_on_empty_history() {
        let n = node(4);
        assert_eq!(n.success_rate(), 0.0);
    }

    #[test]
    fn success_rate_weighs_newest_as_one_over_one() {
        // pushed true, false, true, true (newest last)
        let mut n = node(4);
        n.successes.push(true);
        n.successes.push(false);
        n.successes.push(true);
        n.successes.push(true);
        // newest -> oldest: true, true, false, true
        let expected = 1.0 / 1.0 + 1.0 / 2.0 + 0.0 / 3.0 + 1.0 / 4.0;
        assert!((n.success_rate() - expected).abs() < 1e-9);
    }

    #[test]
    fn success_rate_is_bounded_by_harmonic_sum() {
        let episodes = 4;
        let mut n = node(episodes);
        for _ in 0..episodes {
            n.successes.push(true);
        }
        let harmonic: f64 = (1..=episodes).map(|i| 1.0 / i as f64).sum();
        assert!((n.success_rate() - harmonic).abs() < 1e-9);
        assert!(n.success_rate() <= harmonic + 1e-9);
        assert!(n.success_rate() >= 0.0);
    }

    #[test]
    fn activity_rate_zero_when_no_activity() {
        let mut n = node(6);
        n.capacity = ByteSize::from_gb(10);
        assert_eq!(n.activity_rate(), 0.0);
    }

    #[test]
    fn activity_rate_zero_when_capacity_zero() {
        let mut n = node(6);
        n.activities.push(ActivityRecord {
            start: Utc::now(),
            duration: ChronoDuration::seconds(30),
            bandwidth: ByteSize::from_gb(1),
        });
        assert_eq!(n.activity_rate(), 0.0);
    }

    #[test]
    fn activity_rate_sums_capacity_once_per_present_slot() {
        // capacity 10GB, activities 4/5/6 GB, 6 episodes of history.
        let mut n = node(6);
        n.capacity = ByteSize::from_gb(10);
        for gb in [4u64, 5, 6] {
            n.activities.push(ActivityRecord {
                start: Utc::now(),
                duration: ChronoDuration::seconds(30),
                bandwidth: ByteSize::from_gb(gb),
            });
        }
        assert!((n.activity_rate() - 0.5).abs() < 1e-9);
    }
}
