use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::GaitConfig;
use crate::phases::{PhaseSegmentation, TugPhase};
use crate::pose::LandmarkFrame;
use crate::pose::geometry::hip_mid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneSource {
    /// Bounded by the two measurement lines.
    Lines,
    /// Walking phases of a segmented TUG.
    Phases,
    /// No usable boundaries; the whole stream.
    Whole,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneInterval {
    pub start_time: f64,
    pub end_time: f64,
}

impl ZoneInterval {
    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_time && t <= self.end_time
    }
}

/// Time intervals over which steady-state gait is measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneWindow {
    pub source: ZoneSource,
    pub intervals: Vec<ZoneInterval>,
}

impl ZoneWindow {
    pub fn whole(frames: &[LandmarkFrame]) -> Self {
        let intervals = match (frames.first(), frames.last()) {
            (Some(a), Some(b)) => vec![ZoneInterval {
                start_time: a.time,
                end_time: b.time,
            }],
            _ => Vec::new(),
        };
        Self {
            source: ZoneSource::Whole,
            intervals,
        }
    }

    pub fn duration(&self) -> f64 {
        self.intervals.iter().map(|i| i.duration()).sum()
    }

    pub fn contains(&self, t: f64) -> bool {
        self.interval_of(t).is_some()
    }

    pub fn interval_of(&self, t: f64) -> Option<usize> {
        self.intervals.iter().position(|i| i.contains(t))
    }

    /// True when both times fall inside the same interval.
    pub fn same_interval(&self, a: f64, b: f64) -> bool {
        match (self.interval_of(a), self.interval_of(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }
}

/// A straight-walk zone plus whatever went wrong finding it.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneResult {
    pub zone: ZoneWindow,
    pub warning: Option<String>,
}

/// 10MWT zone from the configured crossing lines.
pub fn ten_meter_zone(frames: &[LandmarkFrame], cfg: &GaitConfig) -> ZoneResult {
    let (Some(a), Some(b)) = (cfg.start_line_x, cfg.end_line_x) else {
        return ZoneResult {
            zone: ZoneWindow::whole(frames),
            warning: Some("measurement lines not configured; using the whole recording".to_string()),
        };
    };
    match line_crossings(frames, a, b, cfg.visibility_threshold) {
        Some((entry, exit)) => ZoneResult {
            zone: ZoneWindow {
                source: ZoneSource::Lines,
                intervals: vec![ZoneInterval {
                    start_time: entry,
                    end_time: exit,
                }],
            },
            warning: None,
        },
        None => {
            warn!(start_line_x = a, end_line_x = b, "measurement lines not crossed");
            ZoneResult {
                zone: ZoneWindow::whole(frames),
                warning: Some("measurement lines not crossed; using the whole recording".to_string()),
            }
        }
    }
}

/// Walk-out and walk-back windows of a TUG segmentation.
pub fn tug_zone(segmentation: &PhaseSegmentation) -> ZoneWindow {
    let intervals = [TugPhase::WalkOut, TugPhase::WalkBack]
        .iter()
        .filter_map(|p| segmentation.phase(*p))
        .filter(|s| s.duration > 0.0)
        .map(|s| ZoneInterval {
            start_time: s.start_time,
            end_time: s.end_time,
        })
        .collect();
    ZoneWindow {
        source: ZoneSource::Phases,
        intervals,
    }
}

/// Entry is the first crossing of either line by the hip midpoint; exit is
/// the next crossing of the other line. Times are interpolated linearly.
pub fn line_crossings(
    frames: &[LandmarkFrame],
    line_a: f64,
    line_b: f64,
    visibility_threshold: f64,
) -> Option<(f64, f64)> {
    let track: Vec<(f64, f64)> = frames
        .iter()
        .filter_map(|f| hip_mid(f, visibility_threshold).map(|(x, _)| (f.time, x)))
        .collect();

    let mut entry: Option<(f64, f64)> = None;
    for pair in track.windows(2) {
        let (t0, x0) = pair[0];
        let (t1, x1) = pair[1];
        match entry {
            None => {
                let ta = crossing_time(t0, x0, t1, x1, line_a);
                let tb = crossing_time(t0, x0, t1, x1, line_b);
                entry = match (ta, tb) {
                    (Some(ta), Some(tb)) if ta <= tb => Some((ta, line_b)),
                    (Some(_), Some(tb)) => Some((tb, line_a)),
                    (Some(ta), None) => Some((ta, line_b)),
                    (None, Some(tb)) => Some((tb, line_a)),
                    (None, None) => None,
                };
                // A single segment can cross both lines when frames are sparse.
                if let (Some(ta), Some(tb)) = (ta, tb) {
                    return Some((ta.min(tb), ta.max(tb)));
                }
            }
            Some((t_entry, other)) => {
                if let Some(t) = crossing_time(t0, x0, t1, x1, other) {
                    if t > t_entry {
                        return Some((t_entry, t));
                    }
                }
            }
        }
    }
    None
}

fn crossing_time(t0: f64, x0: f64, t1: f64, x1: f64, line: f64) -> Option<f64> {
    if x0 == x1 {
        return None;
    }
    let (d0, d1) = (x0 - line, x1 - line);
    // Landing exactly on the line counts once, on the arriving segment.
    if d0 == 0.0 || d0 * d1 > 0.0 {
        return None;
    }
    Some(t0 + (line - x0) / (x1 - x0) * (t1 - t0))
}
