//! Clinical gait variables over a measurement zone.
//!
//! Every variable is optional: missing joints or too few footstrikes omit
//! the variable instead of failing the extraction.

use tracing::debug;

use crate::config::GaitConfig;
use crate::gait::footstrike::{Footstrike, detect_footstrikes};
use crate::gait::zone::ZoneWindow;
use crate::math::stats::{cv_percent, mad, mean, median, percentile, robust_z, safe_ratio, std_dev};
use crate::pose::LandmarkFrame;
use crate::pose::geometry::{Side, leg_length, metres_per_unit, shoulder_mid, trunk_inclination_deg};
use crate::schema::v1::{ClinicalVariable, ClinicalVariables, Variable};

/// Step intervals further than this (robust z) from the median are dropped.
const OUTLIER_Z: f64 = 3.5;

#[derive(Debug, Clone, PartialEq)]
pub struct GaitAnalysis {
    /// Footstrikes inside the zone.
    pub strikes: Vec<Footstrike>,
    pub variables: ClinicalVariables,
    /// Median leg length in image units.
    pub leg_length: Option<f64>,
    pub warnings: Vec<String>,
}

/// Converts image units into reported length units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub factor: f64,
    pub unit: &'static str,
}

impl Scale {
    /// Metres when the patient's height is known, leg lengths otherwise.
    pub fn new(leg_length: f64, height_cm: Option<f64>) -> Self {
        match height_cm.and_then(|h| metres_per_unit(h / 100.0, leg_length)) {
            Some(factor) => Self { factor, unit: "m" },
            None => Self {
                factor: safe_ratio(1.0, leg_length, 0.0),
                unit: "leg",
            },
        }
    }

    pub fn apply(&self, value: f64) -> f64 {
        value * self.factor
    }
}

pub fn extract(
    frames: &[LandmarkFrame],
    zone: &ZoneWindow,
    cfg: &GaitConfig,
    height_cm: Option<f64>,
) -> GaitAnalysis {
    let thr = cfg.visibility_threshold;
    let mut variables = ClinicalVariables::new();
    let mut warnings = Vec::new();

    let zone_frames: Vec<&LandmarkFrame> = frames.iter().filter(|f| zone.contains(f.time)).collect();
    let inclination: Vec<f64> = zone_frames
        .iter()
        .filter_map(|f| trunk_inclination_deg(f, thr))
        .collect();
    if let Some(v) = trunk_inclination(&inclination) {
        variables.insert(Variable::TrunkInclination, v);
    }
    if let Some(v) = trunk_sway(&inclination) {
        variables.insert(Variable::TrunkSway, v);
    }

    let Some(leg) = median_leg_length(&zone_frames, thr).or_else(|| {
        let all: Vec<&LandmarkFrame> = frames.iter().collect();
        median_leg_length(&all, thr)
    }) else {
        warnings.push("leg length unavailable; step-based variables omitted".to_string());
        return GaitAnalysis {
            strikes: Vec::new(),
            variables,
            leg_length: None,
            warnings,
        };
    };
    let scale = Scale::new(leg, height_cm);
    if scale.unit != "m" {
        warnings.push("patient height unknown; lengths reported in leg lengths".to_string());
    }

    let strikes: Vec<Footstrike> = detect_footstrikes(frames, leg, cfg)
        .into_iter()
        .filter(|s| zone.contains(s.time))
        .collect();
    debug!(strikes = strikes.len(), leg_length = leg, "footstrikes detected");
    if strikes.len() < 2 {
        warnings.push(format!("only {} footstrikes detected in the measurement zone", strikes.len()));
    }

    if let Some(v) = cadence(&strikes, zone) {
        variables.insert(Variable::Cadence, v);
    }
    if let Some(v) = step_time(&strikes, zone) {
        variables.insert(Variable::StepTime, v);
    }
    if let Some(v) = stride_time(&strikes, zone) {
        variables.insert(Variable::StrideTime, v);
    }
    if let Some(v) = stride_length(&strikes, zone, scale) {
        variables.insert(Variable::StrideLength, v);
    }

    let grounds = ground_levels(&zone_frames, thr);
    if let Some(v) = double_support(&zone_frames, grounds, leg, cfg) {
        variables.insert(Variable::DoubleSupport, v);
    }
    if let Some(v) = foot_clearance(frames, &strikes, zone, grounds, scale, thr) {
        variables.insert(Variable::FootClearance, v);
    }
    if let Some(v) = arm_swing(frames, &strikes, zone, scale, thr) {
        variables.insert(Variable::ArmSwing, v);
    }

    GaitAnalysis {
        strikes,
        variables,
        leg_length: Some(leg),
        warnings,
    }
}

fn median_leg_length(frames: &[&LandmarkFrame], thr: f64) -> Option<f64> {
    let mut legs: Vec<f64> = frames.iter().filter_map(|f| leg_length(f, thr)).collect();
    if legs.is_empty() {
        return None;
    }
    Some(median(&mut legs))
}

/// Consecutive strike pairs (any side) inside one zone interval.
fn step_pairs<'a>(strikes: &'a [Footstrike], zone: &ZoneWindow) -> Vec<(&'a Footstrike, &'a Footstrike)> {
    strikes
        .windows(2)
        .filter(|w| zone.same_interval(w[0].time, w[1].time))
        .map(|w| (&w[0], &w[1]))
        .collect()
}

/// Consecutive same-side strike pairs inside one zone interval.
fn stride_pairs<'a>(strikes: &'a [Footstrike], zone: &ZoneWindow) -> Vec<(&'a Footstrike, &'a Footstrike)> {
    let mut out = Vec::new();
    for side in Side::BOTH {
        let own: Vec<&Footstrike> = strikes.iter().filter(|s| s.side == side).collect();
        for w in own.windows(2) {
            if zone.same_interval(w[0].time, w[1].time) {
                out.push((w[0], w[1]));
            }
        }
    }
    out
}

fn steady_intervals(intervals: Vec<f64>) -> Vec<f64> {
    if intervals.len() < 4 {
        return intervals;
    }
    let mut scratch = intervals.clone();
    let med = median(&mut scratch);
    let mad_val = mad(&mut scratch, med);
    intervals
        .into_iter()
        .filter(|v| robust_z(*v, med, mad_val).abs() <= OUTLIER_Z)
        .collect()
}

/// Steps per minute, with the strike count as `total_steps`.
pub fn cadence(strikes: &[Footstrike], zone: &ZoneWindow) -> Option<ClinicalVariable> {
    if strikes.is_empty() {
        return None;
    }
    let intervals: Vec<f64> = step_pairs(strikes, zone)
        .iter()
        .map(|(a, b)| b.time - a.time)
        .filter(|d| *d > 0.0)
        .collect();
    let intervals = steady_intervals(intervals);
    let value = if !intervals.is_empty() {
        safe_ratio(60.0, mean(&intervals), 0.0)
    } else {
        let duration = zone.duration();
        if duration <= 0.0 {
            return None;
        }
        strikes.len() as f64 / duration * 60.0
    };
    Some(ClinicalVariable::new(value, "steps/min").with_total_steps(strikes.len() as u32))
}

fn sided(samples: &[(Side, f64)], unit: &str) -> Option<ClinicalVariable> {
    if samples.is_empty() {
        return None;
    }
    let all: Vec<f64> = samples.iter().map(|(_, v)| *v).collect();
    let side_mean = |side: Side| {
        let own: Vec<f64> = samples.iter().filter(|(s, _)| *s == side).map(|(_, v)| *v).collect();
        (!own.is_empty()).then(|| mean(&own))
    };
    Some(
        ClinicalVariable::new(mean(&all), unit)
            .with_sd(std_dev(&all))
            .with_sides(side_mean(Side::Left), side_mean(Side::Right)),
    )
}

/// Interval between opposite-side strikes, attributed to the landing foot.
pub fn step_time(strikes: &[Footstrike], zone: &ZoneWindow) -> Option<ClinicalVariable> {
    let samples: Vec<(Side, f64)> = step_pairs(strikes, zone)
        .into_iter()
        .filter(|(a, b)| a.side != b.side)
        .map(|(a, b)| (b.side, b.time - a.time))
        .collect();
    sided(&samples, "s")
}

pub fn stride_time(strikes: &[Footstrike], zone: &ZoneWindow) -> Option<ClinicalVariable> {
    let samples: Vec<(Side, f64)> = stride_pairs(strikes, zone)
        .into_iter()
        .map(|(a, b)| (a.side, b.time - a.time))
        .collect();
    let values: Vec<f64> = samples.iter().map(|(_, v)| *v).collect();
    sided(&samples, "s").map(|v| v.with_cv(cv_percent(&values)))
}

pub fn stride_length(strikes: &[Footstrike], zone: &ZoneWindow, scale: Scale) -> Option<ClinicalVariable> {
    let samples: Vec<(Side, f64)> = stride_pairs(strikes, zone)
        .into_iter()
        .map(|(a, b)| (a.side, scale.apply((b.ankle_x - a.ankle_x).abs())))
        .collect();
    sided(&samples, scale.unit)
}

pub fn trunk_inclination(inclination: &[f64]) -> Option<ClinicalVariable> {
    if inclination.is_empty() {
        return None;
    }
    Some(ClinicalVariable::new(mean(inclination), "deg").with_sd(std_dev(inclination)))
}

/// Range between the 5th and 95th percentile of trunk inclination.
pub fn trunk_sway(inclination: &[f64]) -> Option<ClinicalVariable> {
    if inclination.len() < 2 {
        return None;
    }
    let mut scratch = inclination.to_vec();
    let hi = percentile(&mut scratch, 95.0);
    let lo = percentile(&mut scratch, 5.0);
    Some(ClinicalVariable::new(hi - lo, "deg"))
}

/// Per-side ground level: the 95th percentile of ankle `y` (y grows down).
fn ground_levels(frames: &[&LandmarkFrame], thr: f64) -> [Option<f64>; 2] {
    let level = |side: Side| {
        let mut ys: Vec<f64> = frames
            .iter()
            .filter_map(|f| f.visible(side.ankle(), thr).map(|j| j.y))
            .collect();
        (!ys.is_empty()).then(|| percentile(&mut ys, 95.0))
    };
    [level(Side::Left), level(Side::Right)]
}

fn ground_of(grounds: [Option<f64>; 2], side: Side) -> Option<f64> {
    match side {
        Side::Left => grounds[0],
        Side::Right => grounds[1],
    }
}

/// Share of contact frames in which both feet are on the ground, percent.
pub fn double_support(
    frames: &[&LandmarkFrame],
    grounds: [Option<f64>; 2],
    leg: f64,
    cfg: &GaitConfig,
) -> Option<ClinicalVariable> {
    let (Some(gl), Some(gr)) = (grounds[0], grounds[1]) else {
        return None;
    };
    let thr = cfg.visibility_threshold;
    let mut any = 0usize;
    let mut both = 0usize;
    for f in frames {
        let (Some(l), Some(r)) = (
            f.visible(Side::Left.ankle(), thr),
            f.visible(Side::Right.ankle(), thr),
        ) else {
            continue;
        };
        let left = safe_ratio(gl - l.y, leg, f64::INFINITY) <= cfg.contact_clearance;
        let right = safe_ratio(gr - r.y, leg, f64::INFINITY) <= cfg.contact_clearance;
        if left || right {
            any += 1;
        }
        if left && right {
            both += 1;
        }
    }
    if any == 0 {
        return None;
    }
    Some(ClinicalVariable::new(both as f64 / any as f64 * 100.0, "%"))
}

/// Peak ankle clearance in each swing between same-side strikes.
pub fn foot_clearance(
    frames: &[LandmarkFrame],
    strikes: &[Footstrike],
    zone: &ZoneWindow,
    grounds: [Option<f64>; 2],
    scale: Scale,
    thr: f64,
) -> Option<ClinicalVariable> {
    let mut samples = Vec::new();
    for (a, b) in stride_pairs(strikes, zone) {
        let Some(ground) = ground_of(grounds, a.side) else {
            continue;
        };
        let Some(span) = frames.get(a.frame..=b.frame) else {
            continue;
        };
        let peak = span
            .iter()
            .filter_map(|f| f.visible(a.side.ankle(), thr).map(|j| ground - j.y))
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))));
        if let Some(peak) = peak {
            samples.push((a.side, scale.apply(peak.max(0.0))));
        }
    }
    sided(&samples, scale.unit)
}

/// Fore-aft wrist excursion relative to the shoulders over each stride.
pub fn arm_swing(
    frames: &[LandmarkFrame],
    strikes: &[Footstrike],
    zone: &ZoneWindow,
    scale: Scale,
    thr: f64,
) -> Option<ClinicalVariable> {
    let mut samples = Vec::new();
    for (a, b) in stride_pairs(strikes, zone) {
        let Some(span) = frames.get(a.frame..=b.frame) else {
            continue;
        };
        let rel: Vec<f64> = span
            .iter()
            .filter_map(|f| {
                let wrist = f.visible(a.side.wrist(), thr)?;
                let (sx, _) = shoulder_mid(f, thr)?;
                Some(wrist.x - sx)
            })
            .collect();
        if rel.len() < 2 {
            continue;
        }
        let max = rel.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = rel.iter().copied().fold(f64::INFINITY, f64::min);
        samples.push((a.side, scale.apply(max - min)));
    }
    sided(&samples, scale.unit)
}
