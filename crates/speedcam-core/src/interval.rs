//! How long to wait before the next inspection round.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, TimeZone, Timelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::bytes::ByteSize;
use crate::error::Error;

const MINUTES_PER_DAY: usize = 1440;
const MIN_ACTIVE_SLOTS: usize = 5;
const TOP_PERCENT_DIVISOR: usize = 20; // lowest 5% of slots

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalStrategy {
    /// Always wait exactly `wait_min` seconds.
    Fixed,
    /// Wait a uniformly random number of seconds in `[wait_min, wait_max)`.
    Random,
    /// Wait until the least-busy minute-of-day observed in recent history.
    Experience,
}

/// One (start, duration, bandwidth) activity record, independent of which node
/// it belongs to — all that `Experience` scheduling needs.
#[derive(Debug, Clone, Copy)]
pub struct ActivityWindow {
    pub start: DateTime<Utc>,
    pub duration: ChronoDuration,
    pub bandwidth: ByteSize,
}

fn wait_random(wait_min: u64, wait_max: u64, rng: &mut impl Rng) -> Result<ChronoDuration, Error> {
    if wait_max <= wait_min {
        return Err(Error::ConfigFatal(format!(
            "interval_wait_max ({wait_max}) must be greater than interval_wait_min ({wait_min})"
        )));
    }
    let secs = rng.random_range(wait_min..wait_max);
    Ok(ChronoDuration::seconds(secs as i64))
}

/// Minute-of-day index, clamped to `[0, 1440)`. The original implementation
/// indexes a fixed 1440-slot array directly and can run past the end of the
/// day for an activity that crosses midnight; clamping here keeps the same
/// slot-selection intent without a possible panic on malformed duration data.
fn minute_of_day_clamped(dt: DateTime<Utc>) -> usize {
    let idx = dt.hour() as usize * 60 + dt.minute() as usize;
    idx.min(MINUTES_PER_DAY - 1)
}

fn wait_experience(
    wait_min: u64,
    wait_max: u64,
    activities: &[ActivityWindow],
    now: DateTime<Utc>,
    rng: &mut impl Rng,
) -> Result<ChronoDuration, Error> {
    let mut slot_activity = [0u64; MINUTES_PER_DAY];

    for activity in activities {
        let start_idx = minute_of_day_clamped(activity.start);
        let end_idx = minute_of_day_clamped(activity.start + activity.duration);
        let (lo, hi) = if start_idx <= end_idx {
            (start_idx, end_idx)
        } else {
            (end_idx, start_idx)
        };
        for slot in slot_activity.iter_mut().take(hi + 1).skip(lo) {
            *slot += activity.bandwidth.bytes();
        }
    }

    let active_slots = slot_activity.iter().filter(|&&v| v != 0).count();
    if active_slots < MIN_ACTIVE_SLOTS {
        return wait_random(wait_min, wait_max, rng);
    }

    let mut ranked: Vec<(usize, u64)> = slot_activity.iter().copied().enumerate().collect();
    ranked.sort_by_key(|&(_, activity)| activity);

    let count = MINUTES_PER_DAY / TOP_PERCENT_DIVISOR;
    let today = Utc
        .with_ymd_and_hms(now.year(), now.month(), now.day(), 0, 0, 0)
        .single()
        .unwrap_or(now);

    let mut candidates: Vec<DateTime<Utc>> = ranked
        .into_iter()
        .take(count)
        .map(|(slot, _)| today + ChronoDuration::minutes(slot as i64))
        .collect();
    candidates.sort();

    for candidate in candidates {
        if candidate > now {
            return Ok(candidate - now);
        }
    }

    let tomorrow = today + ChronoDuration::days(1);
    Ok(tomorrow - now)
}

/// Compute how long to wait before the next inspection round.
pub fn wait_time(
    strategy: IntervalStrategy,
    wait_min: u64,
    wait_max: u64,
    activities: &[ActivityWindow],
    now: DateTime<Utc>,
    rng: &mut impl Rng,
) -> Result<ChronoDuration, Error> {
    match strategy {
        IntervalStrategy::Fixed => Ok(ChronoDuration::seconds(wait_min as i64)),
        IntervalStrategy::Random => wait_random(wait_min, wait_max, rng),
        IntervalStrategy::Experience => wait_experience(wait_min, wait_max, activities, now, rng),
    }
}
