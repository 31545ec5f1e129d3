use serde::{Deserialize, Serialize};

use crate::config::GaitConfig;
use crate::math::signal::{derivative, local_minima, smooth};
use crate::pose::LandmarkFrame;
use crate::pose::geometry::Side;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footstrike {
    pub side: Side,
    pub time: f64,
    /// Index into the frame slice the strike was detected on.
    pub frame: usize,
    pub ankle_x: f64,
}

/// Footstrikes on both sides, ordered by time.
///
/// A strike is a local minimum of the smoothed vertical ankle velocity
/// (upward positive, in leg lengths per second) that is at least
/// `min_strike_velocity` downward. Strikes on the same side closer than
/// `min_step_interval_s` are merged into the earlier one.
pub fn detect_footstrikes(frames: &[LandmarkFrame], leg_length: f64, cfg: &GaitConfig) -> Vec<Footstrike> {
    if leg_length <= 0.0 {
        return Vec::new();
    }
    let mut strikes = Vec::new();
    for side in Side::BOTH {
        strikes.extend(side_strikes(frames, side, leg_length, cfg));
    }
    strikes.sort_by(|a, b| a.time.total_cmp(&b.time));
    strikes
}

fn side_strikes(frames: &[LandmarkFrame], side: Side, leg_length: f64, cfg: &GaitConfig) -> Vec<Footstrike> {
    let mut index = Vec::new();
    let mut times = Vec::new();
    let mut height = Vec::new();
    for (i, f) in frames.iter().enumerate() {
        if let Some(ankle) = f.visible(side.ankle(), cfg.visibility_threshold) {
            index.push(i);
            times.push(f.time);
            height.push(-ankle.y / leg_length);
        }
    }
    let height = smooth(&height, cfg.smoothing_frames);
    let velocity = derivative(&times, &height);

    let mut out: Vec<Footstrike> = Vec::new();
    for k in local_minima(&velocity, -cfg.min_strike_velocity) {
        let time = times[k];
        if let Some(prev) = out.last() {
            if time - prev.time < cfg.min_step_interval_s {
                continue;
            }
        }
        let frame = index[k];
        let ankle_x = frames[frame]
            .joint(side.ankle())
            .map(|j| j.x)
            .unwrap_or(0.0);
        out.push(Footstrike {
            side,
            time,
            frame,
            ankle_x,
        });
    }
    out
}
