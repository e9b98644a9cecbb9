//! Picks which nodes become this round's speed cams.
//!
//! Scoring is a weighted sum of degree, capacity, activity rate, and success
//! rate, normalized against the round's maximum score into `[0, 1]` chances.
//! Selection is then probabilistic — each candidate is kept with probability
//! equal to its own chance — topped up deterministically (highest score first)
//! if probability alone didn't reach the target count.

use rand::Rng;

use crate::error::Error;
use crate::ia::Ia;
use crate::node::NodeInfo;
use crate::scale::{scale, ScaleType};

/// Relative importance of each signal in a node's selection score.
#[derive(Debug, Clone, Copy)]
pub struct SelectorWeights {
    pub degree: f64,
    pub capacity: f64,
    pub success: f64,
    pub activity: f64,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    ia: Ia,
    score: f64,
}

/// Raw (pre-normalization) candidate score for one node — exposed for the
/// result snapshot, which records each node's score at the time of selection.
pub fn score_node(node: &NodeInfo, weights: SelectorWeights) -> f64 {
    calculate_score(node, weights)
}

fn calculate_score(node: &NodeInfo, weights: SelectorWeights) -> f64 {
    node.degree as f64 * weights.degree
        + node.capacity.as_f64() * weights.capacity
        + node.activity_rate() * weights.activity
        + node.success_rate() * weights.success
}

/// Normalize every candidate's score against the round's maximum, in place.
///
/// With no candidates this is a no-op; a non-positive maximum (every score is
/// zero or negative, which happens when all weights are zero) leaves the
/// scores unchanged rather than dividing by a non-positive number.
fn normalize_scores(candidates: &mut [Candidate]) {
    let max_score = candidates
        .iter()
        .map(|c| c.score)
        .fold(f64::NEG_INFINITY, f64::max);
    if max_score <= 0.0 {
        return;
    }
    for c in candidates.iter_mut() {
        c.score /= max_score;
    }
}

/// Select `count` speed cams out of `candidates`, probabilistically first and
/// deterministically (highest score) to make up any shortfall.
fn select_cams(candidates: &[Candidate], count: i64, rng: &mut impl Rng) -> Vec<Ia> {
    if count <= 0 {
        return Vec::new();
    }
    let count = count as usize;

    let mut selected: Vec<Ia> = Vec::new();
    let mut selected_set = std::collections::HashSet::new();
    for c in candidates {
        let chance: f64 = rng.random();
        if chance <= c.score {
            if selected_set.insert(c.ia) {
                selected.push(c.ia);
            }
            if selected.len() == count {
                return selected;
            }
        }
    }

    let mut remaining: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| !selected_set.contains(&c.ia))
        .collect();
    remaining.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    for c in remaining {
        if selected.len() == count {
            break;
        }
        selected.push(c.ia);
    }

    selected
}

/// Score and select this round's usable speed cams from `nodes`.
///
/// `rng` is caller-supplied so that selection is deterministic and testable
/// under a seeded RNG; production callers pass `rand::rng()`.
pub fn select_usable_speed_cams(
    nodes: &[&NodeInfo],
    weights: SelectorWeights,
    scale_type: ScaleType,
    scale_param: f64,
    speed_cam_diff: i64,
    rng: &mut impl Rng,
) -> Result<Vec<Ia>, Error> {
    let mut candidates: Vec<Candidate> = nodes
        .iter()
        .map(|n| Candidate {
            ia: n.ia,
            score: calculate_score(n, weights),
        })
        .collect();

    normalize_scores(&mut candidates);

    let count = scale(scale_type, scale_param, candidates.len())? + speed_cam_diff;
    Ok(select_cams(&candidates, count, rng))
}
