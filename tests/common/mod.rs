#![allow(dead_code)]

use std::f64::consts::{FRAC_PI_2, PI};

use kira_gaitqc::pose::{Joint, JointIndex, LandmarkFrame};

pub const FPS: f64 = 30.0;
/// Hip-knee-ankle length of the synthetic body in image units.
pub const LEG: f64 = 0.4;
const THIGH: f64 = 0.2;
const SHANK: f64 = 0.2;
const KNEE_Y: f64 = 0.7;
const LIFT: f64 = 0.04;
const SWING: f64 = 0.4;

/// Scripted TUG: seated 0-1 s, rise 1-2 s, stand 2-2.5 s, walk out
/// 2.5-5.5 s, turn 5.5-7 s, walk back 7-10 s, sit 10-11 s, seated to 12 s.
pub const TUG_TRUTH: [f64; 4] = [1.5, 5.5, 7.0, 10.0];
pub const TUG_DURATION: f64 = 12.0;

#[derive(Debug, Clone, Copy)]
pub struct Pose {
    pub hip_x: f64,
    /// 0 seated, 1 standing.
    pub stand: f64,
    /// Yaw of the left-right body axis in the x-z plane.
    pub yaw: f64,
    pub lift_left: f64,
    pub lift_right: f64,
}

impl Pose {
    pub fn standing(hip_x: f64) -> Self {
        Self {
            hip_x,
            stand: 1.0,
            yaw: -FRAC_PI_2,
            lift_left: 0.0,
            lift_right: 0.0,
        }
    }
}

fn joint(x: f64, y: f64, z: f64) -> Joint {
    Joint::new(x, y, z, 0.99)
}

/// Side-view body with a constant leg length of [`LEG`].
pub fn body(time: f64, pose: Pose) -> LandmarkFrame {
    let mut joints = vec![Joint::default(); JointIndex::COUNT];
    let theta = pose.stand.clamp(0.0, 1.0) * FRAC_PI_2;
    let hip_y = KNEE_Y - THIGH * theta.sin();
    let knee_x = pose.hip_x + THIGH * theta.cos();
    let (ox, oz) = (0.1 * pose.yaw.cos(), 0.1 * pose.yaw.sin());

    let mut place = |index: JointIndex, x: f64, y: f64, z: f64| {
        joints[index as usize] = joint(x, y, z);
    };
    place(JointIndex::Nose, pose.hip_x, hip_y - 0.4, 0.0);
    for (sign, lift, sh, hip, knee, ankle, wrist) in [
        (
            1.0,
            pose.lift_left,
            JointIndex::LeftShoulder,
            JointIndex::LeftHip,
            JointIndex::LeftKnee,
            JointIndex::LeftAnkle,
            JointIndex::LeftWrist,
        ),
        (
            -1.0,
            pose.lift_right,
            JointIndex::RightShoulder,
            JointIndex::RightHip,
            JointIndex::RightKnee,
            JointIndex::RightAnkle,
            JointIndex::RightWrist,
        ),
    ] {
        let dx = sign * ox;
        let dz = sign * oz;
        let alpha = (1.0 - lift.clamp(0.0, SHANK) / SHANK).acos();
        place(sh, pose.hip_x + dx, hip_y - 0.3, dz);
        place(hip, pose.hip_x + dx, hip_y, dz);
        place(knee, knee_x + dx, KNEE_Y, dz);
        place(
            ankle,
            knee_x + dx - SHANK * alpha.sin(),
            KNEE_Y + SHANK * alpha.cos(),
            dz,
        );
        place(wrist, pose.hip_x + dx + 0.5 * lift, hip_y, dz);
    }
    LandmarkFrame::new(time, joints)
}

/// Swing lift for a stride phase in [0, 1); the foot lands at `SWING`.
fn lift(phase: f64) -> f64 {
    let p = phase.rem_euclid(1.0);
    if p < SWING {
        LIFT * (PI * p / SWING).sin()
    } else {
        0.0
    }
}

/// Alternating steps, one stride per `stride_s`, starting at `t0`.
fn stepping(t: f64, t0: f64, stride_s: f64) -> (f64, f64) {
    let p = (t - t0) / stride_s;
    (lift(p), lift(p + 0.5))
}

fn frame_times(duration: f64) -> impl Iterator<Item = f64> {
    let n = (duration * FPS).round() as usize;
    (0..=n).map(|i| i as f64 / FPS)
}

pub fn tug_pose(t: f64) -> Pose {
    let turn_yaw = |t: f64| -FRAC_PI_2 + PI * ((t - 5.5) / 1.5).clamp(0.0, 1.0);
    match t {
        t if t < 1.0 => Pose {
            stand: 0.0,
            ..Pose::standing(0.2)
        },
        t if t < 2.0 => Pose {
            stand: t - 1.0,
            ..Pose::standing(0.2)
        },
        t if t < 2.5 => Pose::standing(0.2),
        t if t < 5.5 => {
            let (l, r) = stepping(t, 2.5, 1.0);
            Pose {
                lift_left: l,
                lift_right: r,
                ..Pose::standing(0.2 + 0.2 * (t - 2.5))
            }
        }
        t if t < 7.0 => Pose {
            yaw: turn_yaw(t),
            ..Pose::standing(0.8)
        },
        t if t < 10.0 => {
            let (l, r) = stepping(t, 7.0, 1.0);
            Pose {
                yaw: FRAC_PI_2,
                lift_left: l,
                lift_right: r,
                ..Pose::standing(0.8 - 0.2 * (t - 7.0))
            }
        }
        t if t < 11.0 => Pose {
            yaw: FRAC_PI_2,
            stand: 1.0 - (t - 10.0),
            ..Pose::standing(0.2)
        },
        _ => Pose {
            yaw: FRAC_PI_2,
            stand: 0.0,
            ..Pose::standing(0.2)
        },
    }
}

pub fn tug_frames() -> Vec<LandmarkFrame> {
    frame_times(TUG_DURATION).map(|t| body(t, tug_pose(t))).collect()
}

/// Straight walk from x = 0 at `speed` image units per second with a
/// one-second stride (120 steps/min).
pub fn walking_frames(duration: f64, speed: f64) -> Vec<LandmarkFrame> {
    frame_times(duration)
        .map(|t| {
            let (l, r) = stepping(t, 0.0, 1.0);
            body(
                t,
                Pose {
                    lift_left: l,
                    lift_right: r,
                    ..Pose::standing(speed * t)
                },
            )
        })
        .collect()
}

/// Someone standing still for `duration` seconds.
pub fn standing_frames(duration: f64) -> Vec<LandmarkFrame> {
    frame_times(duration)
        .map(|t| body(t, Pose::standing(0.5)))
        .collect()
}

/// Frames with no visible joints.
pub fn empty_frames(duration: f64) -> Vec<LandmarkFrame> {
    frame_times(duration)
        .map(|t| LandmarkFrame::new(t, vec![Joint::default(); JointIndex::COUNT]))
        .collect()
}

pub fn to_document(frames: &[LandmarkFrame]) -> String {
    serde_json::json!({ "fps": FPS, "frames": frames }).to_string()
}

pub fn to_json_lines(frames: &[LandmarkFrame]) -> String {
    let mut out = String::new();
    for f in frames {
        out.push_str(&serde_json::to_string(f).unwrap());
        out.push('\n');
    }
    out
}

pub fn approx(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}
