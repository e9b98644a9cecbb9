//! Algorithm configuration: a raw, all-optional `SpeedCamConfigInput` parsed
//! straight off TOML/JSON, resolved into a fully-populated `SpeedCamConfig`
//! with defaults filled in and invalid combinations rejected once, up front.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::interval::IntervalStrategy;
use crate::scale::ScaleType;

pub const DEFAULT_EPISODES: usize = 6;
pub const DEFAULT_WEIGHT: f64 = 1.0;
pub const DEFAULT_SPEED_CAM_DIFF: i64 = 0;
pub const DEFAULT_MAX_RESULTS: i64 = -1;
pub const DEFAULT_SCALE_PARAM: f64 = 0.2;
pub const DEFAULT_INTERVAL_WAIT_MIN: u64 = 10;
pub const DEFAULT_INTERVAL_WAIT_MAX: u64 = 3600;

/// Raw, as-deserialized configuration. Every field is optional so that a
/// caller's TOML/JSON file only needs to set what it wants to override.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SpeedCamConfigInput {
    pub episodes: Option<usize>,
    pub weight_degree: Option<f64>,
    pub weight_capacity: Option<f64>,
    pub weight_success: Option<f64>,
    pub weight_activity: Option<f64>,
    pub speed_cam_diff: Option<i64>,
    pub result_dir: Option<String>,
    pub max_results: Option<i64>,
    pub scale_type: Option<String>,
    pub scale_param: Option<f64>,
    pub interval_strategy: Option<String>,
    pub interval_wait_min: Option<u64>,
    pub interval_wait_max: Option<u64>,
}

/// Fully resolved algorithm configuration, as used by the selector, the
/// interval scheduler, and the result sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedCamConfig {
    pub episodes: usize,
    pub weight_degree: f64,
    pub weight_capacity: f64,
    pub weight_success: f64,
    pub weight_activity: f64,
    pub speed_cam_diff: i64,
    pub result_dir: Option<String>,
    /// Zero or negative stands for infinite retention.
    pub max_results: i64,
    pub scale_type: ScaleType,
    pub scale_param: f64,
    pub interval_strategy: IntervalStrategy,
    pub interval_wait_min: u64,
    pub interval_wait_max: u64,
}

impl Default for SpeedCamConfig {
    fn default() -> Self {
        Self {
            episodes: DEFAULT_EPISODES,
            weight_degree: DEFAULT_WEIGHT,
            weight_capacity: DEFAULT_WEIGHT,
            weight_success: DEFAULT_WEIGHT,
            weight_activity: DEFAULT_WEIGHT,
            speed_cam_diff: DEFAULT_SPEED_CAM_DIFF,
            result_dir: None,
            max_results: DEFAULT_MAX_RESULTS,
            scale_type: ScaleType::Linear,
            scale_param: DEFAULT_SCALE_PARAM,
            interval_strategy: IntervalStrategy::Fixed,
            interval_wait_min: DEFAULT_INTERVAL_WAIT_MIN,
            interval_wait_max: DEFAULT_INTERVAL_WAIT_MAX,
        }
    }
}

impl SpeedCamConfig {
    /// Zero or negative `max_results` means results are never pruned.
    pub fn stores_infinite_files(&self) -> bool {
        self.max_results <= 0
    }
}

fn parse_scale_type(raw: &str) -> Result<ScaleType, Error> {
    match raw {
        "const" => Ok(ScaleType::Const),
        "linear" => Ok(ScaleType::Linear),
        "log" => Ok(ScaleType::Log),
        other => Err(Error::ConfigFatal(format!(
            "unsupported scale_type '{other}'"
        ))),
    }
}

fn parse_interval_strategy(raw: &str) -> Result<IntervalStrategy, Error> {
    match raw {
        "fixed" => Ok(IntervalStrategy::Fixed),
        "random" => Ok(IntervalStrategy::Random),
        "experience" => Ok(IntervalStrategy::Experience),
        other => Err(Error::ConfigFatal(format!(
            "unsupported interval_strategy '{other}'"
        ))),
    }
}

impl SpeedCamConfigInput {
    pub fn resolve(self) -> Result<SpeedCamConfig, Error> {
        let defaults = SpeedCamConfig::default();

        let scale_type = match self.scale_type {
            Some(raw) => parse_scale_type(&raw)?,
            None => defaults.scale_type,
        };
        let interval_strategy = match self.interval_strategy {
            Some(raw) => parse_interval_strategy(&raw)?,
            None => defaults.interval_strategy,
        };

        let interval_wait_min = self.interval_wait_min.unwrap_or(defaults.interval_wait_min);
        let interval_wait_max = self.interval_wait_max.unwrap_or(defaults.interval_wait_max);
        if interval_strategy == IntervalStrategy::Random && interval_wait_max <= interval_wait_min
        {
            return Err(Error::ConfigFatal(format!(
                "interval_wait_max ({interval_wait_max}) must exceed interval_wait_min ({interval_wait_min}) for the random strategy"
            )));
        }

        let scale_param = self.scale_param.unwrap_or(defaults.scale_param);
        if scale_param < 0.0 {
            return Err(Error::ConfigFatal(format!(
                "scale_param ({scale_param}) cannot be negative"
            )));
        }
        if scale_type == ScaleType::Log && scale_param == 1.0 {
            return Err(Error::ConfigFatal(
                "scale_type 'log' cannot use a base of 1".to_string(),
            ));
        }

        Ok(SpeedCamConfig {
            episodes: self.episodes.unwrap_or(defaults.episodes),
            weight_degree: self.weight_degree.unwrap_or(defaults.weight_degree),
            weight_capacity: self.weight_capacity.unwrap_or(defaults.weight_capacity),
            weight_success: self.weight_success.unwrap_or(defaults.weight_success),
            weight_activity: self.weight_activity.unwrap_or(defaults.weight_activity),
            speed_cam_diff: self.speed_cam_diff.unwrap_or(defaults.speed_cam_diff),
            result_dir: self.result_dir.filter(|s| !s.is_empty()),
            max_results: self.max_results.unwrap_or(defaults.max_results),
            scale_type,
            scale_param,
            interval_strategy,
            interval_wait_min,
            interval_wait_max,
        })
    }
}

impl SpeedCamConfig {
    /// Parse and resolve a TOML document; an empty document resolves to
    /// defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, Error> {
        if input.trim().is_empty() {
            return Ok(SpeedCamConfig::default());
        }
        let parsed: SpeedCamConfigInput =
            toml::from_str(input).map_err(|e| Error::ConfigFatal(format!("invalid config TOML: {e}")))?;
        parsed.resolve()
    }
}
