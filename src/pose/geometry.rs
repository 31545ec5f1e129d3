//! Per-frame body geometry derived from landmarks.
//!
//! Coordinates are normalised image units with `y` growing downward, so
//! "height above" a point is a positive `y` difference.

use serde::{Deserialize, Serialize};

use crate::pose::{Joint, JointIndex, LandmarkFrame};

/// Trochanter-to-ankle length as a fraction of stature (Drillis & Contini).
pub const LEG_TO_STATURE: f64 = 0.491;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn hip(self) -> JointIndex {
        match self {
            Side::Left => JointIndex::LeftHip,
            Side::Right => JointIndex::RightHip,
        }
    }

    pub fn knee(self) -> JointIndex {
        match self {
            Side::Left => JointIndex::LeftKnee,
            Side::Right => JointIndex::RightKnee,
        }
    }

    pub fn ankle(self) -> JointIndex {
        match self {
            Side::Left => JointIndex::LeftAnkle,
            Side::Right => JointIndex::RightAnkle,
        }
    }

    pub fn shoulder(self) -> JointIndex {
        match self {
            Side::Left => JointIndex::LeftShoulder,
            Side::Right => JointIndex::RightShoulder,
        }
    }

    pub fn wrist(self) -> JointIndex {
        match self {
            Side::Left => JointIndex::LeftWrist,
            Side::Right => JointIndex::RightWrist,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Compact per-frame signals consumed by the phase detectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameFeatures {
    pub time: f64,
    pub detected: bool,
    /// Vertical hip-to-ankle distance over leg length: ~1 standing, ~0.5 seated.
    pub hip_height: Option<f64>,
    /// Orientation of the shoulder/hip lines in the x-z plane (radians).
    pub trunk_yaw: Option<f64>,
    pub hip_x: Option<f64>,
    pub leg_length: Option<f64>,
}

impl FrameFeatures {
    pub fn from_frame(frame: &LandmarkFrame, threshold: f64) -> Self {
        Self {
            time: frame.time,
            detected: frame.is_detected(threshold),
            hip_height: hip_height(frame, threshold),
            trunk_yaw: trunk_yaw(frame, threshold),
            hip_x: hip_mid(frame, threshold).map(|(x, _)| x),
            leg_length: leg_length(frame, threshold),
        }
    }
}

fn dist(a: &Joint, b: &Joint) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

fn side_leg(frame: &LandmarkFrame, side: Side, threshold: f64) -> Option<(f64, f64)> {
    let hip = frame.visible(side.hip(), threshold)?;
    let knee = frame.visible(side.knee(), threshold)?;
    let ankle = frame.visible(side.ankle(), threshold)?;
    let length = dist(hip, knee) + dist(knee, ankle);
    if length <= 0.0 {
        return None;
    }
    Some((length, ankle.y - hip.y))
}

/// Mean 2D hip-knee-ankle length over the visible sides.
pub fn leg_length(frame: &LandmarkFrame, threshold: f64) -> Option<f64> {
    let legs: Vec<f64> = Side::BOTH
        .iter()
        .filter_map(|&s| side_leg(frame, s, threshold).map(|(l, _)| l))
        .collect();
    if legs.is_empty() {
        None
    } else {
        Some(legs.iter().sum::<f64>() / legs.len() as f64)
    }
}

pub fn hip_height(frame: &LandmarkFrame, threshold: f64) -> Option<f64> {
    let ratios: Vec<f64> = Side::BOTH
        .iter()
        .filter_map(|&s| side_leg(frame, s, threshold).map(|(l, v)| v / l))
        .collect();
    if ratios.is_empty() {
        None
    } else {
        Some(ratios.iter().sum::<f64>() / ratios.len() as f64)
    }
}

fn mid(frame: &LandmarkFrame, a: JointIndex, b: JointIndex, threshold: f64) -> Option<(f64, f64)> {
    match (frame.visible(a, threshold), frame.visible(b, threshold)) {
        (Some(p), Some(q)) => Some(((p.x + q.x) / 2.0, (p.y + q.y) / 2.0)),
        (Some(p), None) | (None, Some(p)) => Some((p.x, p.y)),
        (None, None) => None,
    }
}

pub fn hip_mid(frame: &LandmarkFrame, threshold: f64) -> Option<(f64, f64)> {
    mid(frame, JointIndex::LeftHip, JointIndex::RightHip, threshold)
}

pub fn shoulder_mid(frame: &LandmarkFrame, threshold: f64) -> Option<(f64, f64)> {
    mid(
        frame,
        JointIndex::LeftShoulder,
        JointIndex::RightShoulder,
        threshold,
    )
}

fn line_yaw(frame: &LandmarkFrame, a: JointIndex, b: JointIndex, threshold: f64) -> Option<f64> {
    let l = frame.visible(a, threshold)?;
    let r = frame.visible(b, threshold)?;
    let dx = l.x - r.x;
    let dz = l.z - r.z;
    if dx == 0.0 && dz == 0.0 {
        return None;
    }
    Some(dz.atan2(dx))
}

/// Circular mean of the shoulder-line and hip-line yaw.
pub fn trunk_yaw(frame: &LandmarkFrame, threshold: f64) -> Option<f64> {
    let angles: Vec<f64> = [
        line_yaw(
            frame,
            JointIndex::LeftShoulder,
            JointIndex::RightShoulder,
            threshold,
        ),
        line_yaw(frame, JointIndex::LeftHip, JointIndex::RightHip, threshold),
    ]
    .into_iter()
    .flatten()
    .collect();
    if angles.is_empty() {
        return None;
    }
    let s: f64 = angles.iter().map(|a| a.sin()).sum();
    let c: f64 = angles.iter().map(|a| a.cos()).sum();
    Some(s.atan2(c))
}

/// Angle of the hip-mid to shoulder-mid segment from vertical, in degrees.
pub fn trunk_inclination_deg(frame: &LandmarkFrame, threshold: f64) -> Option<f64> {
    let (sx, sy) = shoulder_mid(frame, threshold)?;
    let (hx, hy) = hip_mid(frame, threshold)?;
    let up = hy - sy;
    let lateral = (sx - hx).abs();
    if up == 0.0 && lateral == 0.0 {
        return None;
    }
    Some(lateral.atan2(up).to_degrees())
}

/// Metres per normalised image unit from the patient's stature and the
/// observed leg length.
pub fn metres_per_unit(height_m: f64, leg_length_units: f64) -> Option<f64> {
    if height_m <= 0.0 || leg_length_units <= 0.0 {
        return None;
    }
    Some(LEG_TO_STATURE * height_m / leg_length_units)
}
