//! One pure transition detector per TUG edge.
//!
//! Every detector looks at an oldest-first window of frame features and
//! either confirms the transition or returns `None`. A transition is
//! confirmed when enough of the window's evaluable samples satisfy the
//! edge predicate; its onset is the first qualifying sample.

use crate::config::PhaseConfig;
use crate::math::signal::wrap_angle;
use crate::math::stats::variance;
use crate::phases::TugPhase;
use crate::pose::geometry::FrameFeatures;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Offset of the onset frame within the window.
    pub onset: usize,
    /// Qualifying fraction times valid fraction, 0..1.
    pub confidence: f64,
}

/// Evaluates the detector for the edge leaving `current`.
pub fn detect(current: TugPhase, window: &[FrameFeatures], cfg: &PhaseConfig) -> Option<Detection> {
    match current {
        TugPhase::StandUp => detect_standing(window, cfg),
        TugPhase::WalkOut => detect_turn_start(window, cfg),
        TugPhase::Turn => detect_turn_end(window, cfg),
        TugPhase::WalkBack => detect_sit_start(window, cfg),
        TugPhase::SitDown => None,
    }
}

/// Hip height has risen to the standing level and stopped moving.
pub fn detect_standing(window: &[FrameFeatures], cfg: &PhaseConfig) -> Option<Detection> {
    let heights: Vec<(usize, f64)> = window
        .iter()
        .enumerate()
        .filter_map(|(i, f)| f.hip_height.map(|h| (i, h)))
        .collect();
    let valid = valid_fraction(heights.len(), window.len(), cfg)?;

    let standing: Vec<(usize, f64)> = heights
        .iter()
        .copied()
        .filter(|(_, h)| *h >= cfg.standing_height)
        .collect();
    let qualifying = standing.len() as f64 / heights.len() as f64;
    if qualifying < cfg.sustain_fraction {
        return None;
    }
    let (_, last) = heights[heights.len() - 1];
    if last < cfg.standing_height {
        return None;
    }
    let values: Vec<f64> = standing.iter().map(|(_, h)| *h).collect();
    if variance(&values) > cfg.stable_variance {
        return None;
    }
    Some(Detection {
        onset: standing[0].0,
        confidence: qualifying * valid,
    })
}

/// Trunk yaw rate exceeds the turning threshold for most of the window.
pub fn detect_turn_start(window: &[FrameFeatures], cfg: &PhaseConfig) -> Option<Detection> {
    let rates = yaw_rates(window);
    sustained(&rates, window.len(), cfg, |s| s.yaw_rate.abs() >= cfg.turn_rate)
}

/// Rotation has settled and forward translation resumed.
pub fn detect_turn_end(window: &[FrameFeatures], cfg: &PhaseConfig) -> Option<Detection> {
    let steps: Vec<Step> = yaw_rates(window)
        .into_iter()
        .filter_map(|mut s| {
            let a = &window[s.index - 1];
            let b = &window[s.index];
            let (xa, xb) = (a.hip_x?, b.hip_x?);
            let leg = match (a.leg_length, b.leg_length) {
                (Some(la), Some(lb)) => (la + lb) / 2.0,
                (Some(l), None) | (None, Some(l)) => l,
                (None, None) => return None,
            };
            if leg <= 0.0 {
                return None;
            }
            s.forward_velocity = (xb - xa) / (b.time - a.time) / leg;
            Some(s)
        })
        .collect();
    sustained(&steps, window.len(), cfg, |s| {
        s.yaw_rate.abs() < cfg.turn_exit_rate && s.forward_velocity.abs() >= cfg.walk_velocity
    })
}

/// Hip height is descending and already below the standing level.
pub fn detect_sit_start(window: &[FrameFeatures], cfg: &PhaseConfig) -> Option<Detection> {
    let last_height = window.iter().rev().find_map(|f| f.hip_height)?;
    if last_height >= cfg.standing_height {
        return None;
    }
    let mut steps = Vec::new();
    for i in 1..window.len() {
        let (a, b) = (&window[i - 1], &window[i]);
        let dt = b.time - a.time;
        if dt <= 0.0 {
            continue;
        }
        if let (Some(ha), Some(hb)) = (a.hip_height, b.hip_height) {
            steps.push(Step {
                index: i,
                yaw_rate: 0.0,
                forward_velocity: 0.0,
                height_rate: (hb - ha) / dt,
            });
        }
    }
    sustained(&steps, window.len(), cfg, |s| s.height_rate <= -cfg.descent_rate)
}

/// Frame-to-frame rates between window positions `index - 1` and `index`.
#[derive(Debug, Clone, Copy)]
struct Step {
    index: usize,
    yaw_rate: f64,
    forward_velocity: f64,
    height_rate: f64,
}

fn yaw_rates(window: &[FrameFeatures]) -> Vec<Step> {
    let mut steps = Vec::new();
    for i in 1..window.len() {
        let (a, b) = (&window[i - 1], &window[i]);
        let dt = b.time - a.time;
        if dt <= 0.0 {
            continue;
        }
        if let (Some(ya), Some(yb)) = (a.trunk_yaw, b.trunk_yaw) {
            steps.push(Step {
                index: i,
                yaw_rate: wrap_angle(yb - ya) / dt,
                forward_velocity: 0.0,
                height_rate: 0.0,
            });
        }
    }
    steps
}

fn sustained<F>(steps: &[Step], window_len: usize, cfg: &PhaseConfig, predicate: F) -> Option<Detection>
where
    F: Fn(&Step) -> bool,
{
    if window_len < 2 {
        return None;
    }
    let valid = valid_fraction(steps.len(), window_len - 1, cfg)?;
    let qualifying: Vec<&Step> = steps.iter().filter(|s| predicate(s)).collect();
    let fraction = qualifying.len() as f64 / steps.len() as f64;
    if fraction < cfg.sustain_fraction {
        return None;
    }
    Some(Detection {
        onset: qualifying[0].index - 1,
        confidence: fraction * valid,
    })
}

fn valid_fraction(valid: usize, total: usize, cfg: &PhaseConfig) -> Option<f64> {
    if valid == 0 || total == 0 {
        return None;
    }
    let fraction = valid as f64 / total as f64;
    if fraction < cfg.min_valid_fraction {
        None
    } else {
        Some(fraction.min(1.0))
    }
}
