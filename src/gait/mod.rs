//! Measurement zone, footstrikes and clinical gait variables.

pub mod footstrike;
pub mod metrics;
pub mod zone;

use crate::config::GaitConfig;
use crate::math::stats::safe_ratio;
use crate::phases::PhaseSegmentation;
use crate::pose::LandmarkFrame;
use crate::schema::v1::TestType;
use zone::{ZoneWindow, tug_zone, ten_meter_zone};

#[derive(Debug, Clone, PartialEq)]
pub struct WalkTiming {
    pub zone: ZoneWindow,
    pub walk_time_seconds: f64,
    pub walk_speed_mps: f64,
    pub warnings: Vec<String>,
}

/// Test time and speed for a protocol.
///
/// 10MWT times the zone between the measurement lines, TUG times the whole
/// segmented test and BBS reports the recording length with no speed.
pub fn walk_timing(
    test_type: TestType,
    frames: &[LandmarkFrame],
    segmentation: Option<&PhaseSegmentation>,
    cfg: &GaitConfig,
) -> WalkTiming {
    let stream_duration = match (frames.first(), frames.last()) {
        (Some(a), Some(b)) => b.time - a.time,
        _ => 0.0,
    };
    match test_type {
        TestType::TenMeterWalk => {
            let found = ten_meter_zone(frames, cfg);
            let walk_time = found.zone.duration();
            WalkTiming {
                walk_time_seconds: walk_time,
                walk_speed_mps: safe_ratio(cfg.zone_distance_m, walk_time, 0.0),
                zone: found.zone,
                warnings: found.warning.into_iter().collect(),
            }
        }
        TestType::Tug => match segmentation {
            Some(seg) => WalkTiming {
                zone: tug_zone(seg),
                walk_time_seconds: seg.total_time,
                walk_speed_mps: safe_ratio(cfg.tug_distance_m, seg.total_time, 0.0),
                warnings: Vec::new(),
            },
            None => WalkTiming {
                zone: ZoneWindow::whole(frames),
                walk_time_seconds: stream_duration,
                walk_speed_mps: safe_ratio(cfg.tug_distance_m, stream_duration, 0.0),
                warnings: vec!["TUG analysed without phase segmentation".to_string()],
            },
        },
        TestType::BergBalance => WalkTiming {
            zone: ZoneWindow::whole(frames),
            walk_time_seconds: stream_duration,
            walk_speed_mps: 0.0,
            warnings: Vec::new(),
        },
    }
}
