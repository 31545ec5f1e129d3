//! Landmark frames produced by the external pose estimator.

pub mod geometry;

use serde::{Deserialize, Serialize};

/// BlazePose 33-point topology; only the joints the engine reads are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum JointIndex {
    Nose = 0,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl JointIndex {
    pub const COUNT: usize = 33;

    /// Joints that must be visible for a frame to count as detected.
    pub const CORE: [JointIndex; 8] = [
        JointIndex::LeftShoulder,
        JointIndex::RightShoulder,
        JointIndex::LeftHip,
        JointIndex::RightHip,
        JointIndex::LeftKnee,
        JointIndex::RightKnee,
        JointIndex::LeftAnkle,
        JointIndex::RightAnkle,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub visibility: f64,
}

impl Joint {
    pub fn new(x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self { x, y, z, visibility }
    }

    pub fn is_visible(&self, threshold: f64) -> bool {
        self.visibility >= threshold && self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Seconds since the start of the video.
    pub time: f64,
    pub joints: Vec<Joint>,
}

impl LandmarkFrame {
    pub fn new(time: f64, joints: Vec<Joint>) -> Self {
        Self { time, joints }
    }

    pub fn joint(&self, index: JointIndex) -> Option<&Joint> {
        self.joints.get(index as usize)
    }

    /// Joint if present and at or above the visibility threshold.
    pub fn visible(&self, index: JointIndex, threshold: f64) -> Option<&Joint> {
        self.joint(index).filter(|j| j.is_visible(threshold))
    }

    /// True when every core joint is visible.
    pub fn is_detected(&self, threshold: f64) -> bool {
        JointIndex::CORE
            .iter()
            .all(|&j| self.visible(j, threshold).is_some())
    }
}

/// Fraction of frames in which the core joints were detected.
pub fn detection_rate(frames: &[LandmarkFrame], threshold: f64) -> f64 {
    if frames.is_empty() {
        return 0.0;
    }
    let detected = frames.iter().filter(|f| f.is_detected(threshold)).count();
    detected as f64 / frames.len() as f64
}

/// Keeps frames with strictly increasing timestamps; returns the number
/// of frames dropped.
pub fn drop_out_of_order(frames: &mut Vec<LandmarkFrame>) -> usize {
    let before = frames.len();
    let mut last = f64::NEG_INFINITY;
    frames.retain(|f| {
        if f.time.is_finite() && f.time > last {
            last = f.time;
            true
        } else {
            false
        }
    });
    before - frames.len()
}
