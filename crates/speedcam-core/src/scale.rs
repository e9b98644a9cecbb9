//! The speed-cam count scaling function.
//!
//! Given the number of usable candidate nodes in a round, decides how many
//! speed cams to place this round, before `SpeedCamDiff` is added on top.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// How the target speed-cam count scales with the number of usable nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleType {
    /// Always `scale_param` cams, regardless of `n`.
    Const,
    /// `n * scale_param` cams.
    Linear,
    /// `ceil(log_base(n))` cams, where `scale_param` is the log base.
    Log,
}

/// Apply `scale_type` with `scale_param` to `n` usable nodes.
///
/// `scale_param` must be non-negative; for `Log`, it must not equal `1.0`
/// (undefined log base). Both violations are `Error::ConfigFatal` — this is a
/// misconfiguration, not a per-round data problem, so it's never caught and
/// continued past by a caller.
pub fn scale(scale_type: ScaleType, scale_param: f64, n: usize) -> Result<i64, Error> {
    if scale_param < 0.0 {
        return Err(Error::ConfigFatal(format!(
            "scale param {scale_param} cannot be negative"
        )));
    }
    match scale_type {
        ScaleType::Const => Ok(scale_param as i64),
        ScaleType::Linear => Ok((n as f64 * scale_param) as i64),
        ScaleType::Log => {
            if scale_param == 1.0 {
                return Err(Error::ConfigFatal("invalid log base of 1".to_string()));
            }
            let size = n as f64;
            let result = (size.ln() / scale_param.ln()).ceil();
            Ok(result as i64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn const_scale_ignores_n() {
        assert_eq!(scale(ScaleType::Const, 3.0, 100).unwrap(), 3);
        assert_eq!(scale(ScaleType::Const, 3.0, 1).unwrap(), 3);
    }

    #[test]
    fn linear_scale_multiplies() {
        assert_eq!(scale(ScaleType::Linear, 0.2, 50).unwrap(), 10);
    }

    #[test]
    fn log_scale_takes_ceiling() {
        // log base 2 of 100 ~= 6.64 -> ceil 7
        assert_eq!(scale(ScaleType::Log, 2.0, 100).unwrap(), 7);
    }

    #[test]
    fn log_scale_rejects_base_one() {
        assert!(matches!(
            scale(ScaleType::Log, 1.0, 10),
            Err(Error::ConfigFatal(_))
        ));
    }

    #[test]
    fn negative_scale_param_is_fatal() {
        assert!(matches!(
            scale(ScaleType::Linear, -1.0, 10),
            Err(Error::ConfigFatal(_))
        ));
    }
}
