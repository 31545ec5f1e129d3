use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::schema::v1::TestType;

/// Longest forecast or goal horizon accepted, in weeks.
pub const MAX_HORIZON_WEEKS: u32 = 520;

/// Tunable thresholds. Every field has a default, so an empty TOML file
/// (or no file at all) yields `Config::default()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub phases: PhaseConfig,
    #[serde(default)]
    pub gait: GaitConfig,
    #[serde(default)]
    pub confidence: ConfidenceConfig,
    #[serde(default)]
    pub trend: TrendConfig,
    #[serde(default)]
    pub correlation: CorrelationConfig,
    #[serde(default)]
    pub live: LiveConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    /// Frames per detector window (0.5 s at 30 fps).
    pub window_frames: usize,
    pub min_valid_fraction: f64,
    /// Share of window steps that must satisfy a detector's predicate.
    pub sustain_fraction: f64,
    /// Normalised hip height above which the patient counts as standing.
    pub standing_height: f64,
    pub stable_variance: f64,
    /// Trunk yaw rate (rad/s) that starts a turn.
    pub turn_rate: f64,
    /// Trunk yaw rate (rad/s) below which a turn has ended.
    pub turn_exit_rate: f64,
    /// Forward hip velocity in leg lengths per second.
    pub walk_velocity: f64,
    /// Hip height drop rate (1/s) that starts sitting down.
    pub descent_rate: f64,
    /// Relative phase lengths used when transitions cannot be detected.
    pub fallback_weights: [f64; 5],
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            window_frames: 15,
            min_valid_fraction: 0.6,
            sustain_fraction: 0.7,
            standing_height: 0.85,
            stable_variance: 0.002,
            turn_rate: 1.0,
            turn_exit_rate: 0.5,
            walk_velocity: 0.25,
            descent_rate: 0.25,
            fallback_weights: [0.15, 0.25, 0.15, 0.25, 0.20],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaitConfig {
    pub visibility_threshold: f64,
    /// Downward ankle velocity (leg lengths/s) a footstrike must exceed.
    pub min_strike_velocity: f64,
    pub min_step_interval_s: f64,
    /// Ankle clearance (leg lengths) under which a foot is in contact.
    pub contact_clearance: f64,
    pub smoothing_frames: usize,
    pub zone_distance_m: f64,
    pub tug_distance_m: f64,
    pub start_line_x: Option<f64>,
    pub end_line_x: Option<f64>,
}

impl Default for GaitConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: 0.5,
            min_strike_velocity: 0.2,
            min_step_interval_s: 0.25,
            contact_clearance: 0.02,
            smoothing_frames: 3,
            zone_distance_m: 10.0,
            tug_distance_m: 6.0,
            start_line_x: None,
            end_line_x: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub detection_weight: f64,
    pub duration_weight: f64,
    pub time_weight: f64,
    pub speed_weight: f64,
    pub ten_meter_time_range: [f64; 2],
    pub tug_time_range: [f64; 2],
    pub bbs_time_range: [f64; 2],
    pub speed_range: [f64; 2],
    pub min_walk_fraction: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            detection_weight: 0.4,
            duration_weight: 0.2,
            time_weight: 0.2,
            speed_weight: 0.2,
            ten_meter_time_range: [3.0, 60.0],
            tug_time_range: [4.0, 60.0],
            bbs_time_range: [10.0, 1200.0],
            speed_range: [0.1, 2.5],
            min_walk_fraction: 0.2,
        }
    }
}

impl ConfidenceConfig {
    pub fn time_range(&self, test_type: TestType) -> [f64; 2] {
        match test_type {
            TestType::TenMeterWalk => self.ten_meter_time_range,
            TestType::Tug => self.tug_time_range,
            TestType::BergBalance => self.bbs_time_range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub min_points: usize,
    pub horizons_weeks: Vec<u32>,
    pub interval_level: f64,
    pub max_eta_weeks: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            min_points: 3,
            horizons_weeks: vec![2, 4, 8],
            interval_level: 0.95,
            max_eta_weeks: 104.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    pub min_samples: usize,
    pub threshold: f64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            min_samples: 5,
            threshold: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    pub channel_capacity: usize,
    pub heartbeat_interval_ms: u64,
    pub update_interval_s: f64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            heartbeat_interval_ms: 1000,
            update_interval_s: 0.5,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.phases;
        if p.window_frames < 3 {
            bail!("phases.window_frames must be at least 3");
        }
        for (name, v) in [
            ("phases.min_valid_fraction", p.min_valid_fraction),
            ("phases.sustain_fraction", p.sustain_fraction),
        ] {
            if !(v > 0.0 && v <= 1.0) {
                bail!("{} must be in (0, 1]", name);
            }
        }
        for (name, v) in [
            ("phases.standing_height", p.standing_height),
            ("phases.stable_variance", p.stable_variance),
            ("phases.turn_rate", p.turn_rate),
            ("phases.turn_exit_rate", p.turn_exit_rate),
            ("phases.walk_velocity", p.walk_velocity),
            ("phases.descent_rate", p.descent_rate),
            ("gait.min_strike_velocity", self.gait.min_strike_velocity),
            ("gait.min_step_interval_s", self.gait.min_step_interval_s),
            ("gait.contact_clearance", self.gait.contact_clearance),
            ("gait.zone_distance_m", self.gait.zone_distance_m),
            ("gait.tug_distance_m", self.gait.tug_distance_m),
            ("live.update_interval_s", self.live.update_interval_s),
        ] {
            if !(v > 0.0 && v.is_finite()) {
                bail!("{} must be positive", name);
            }
        }
        if p.turn_exit_rate > p.turn_rate {
            bail!("phases.turn_exit_rate must not exceed phases.turn_rate");
        }
        if p.fallback_weights.iter().any(|w| *w <= 0.0) {
            bail!("phases.fallback_weights must all be positive");
        }
        if let (Some(a), Some(b)) = (self.gait.start_line_x, self.gait.end_line_x) {
            if a == b {
                bail!("gait.start_line_x and gait.end_line_x must differ");
            }
        }

        let c = &self.confidence;
        for (name, w) in [
            ("confidence.detection_weight", c.detection_weight),
            ("confidence.duration_weight", c.duration_weight),
            ("confidence.time_weight", c.time_weight),
            ("confidence.speed_weight", c.speed_weight),
        ] {
            if !(w >= 0.0 && w.is_finite()) {
                bail!("{} must not be negative", name);
            }
        }
        let weight_sum = c.detection_weight + c.duration_weight + c.time_weight + c.speed_weight;
        if (weight_sum - 1.0).abs() > 1e-6 {
            bail!("confidence weights must sum to 1 (got {:.4})", weight_sum);
        }
        for (name, r) in [
            ("confidence.ten_meter_time_range", c.ten_meter_time_range),
            ("confidence.tug_time_range", c.tug_time_range),
            ("confidence.bbs_time_range", c.bbs_time_range),
            ("confidence.speed_range", c.speed_range),
        ] {
            if !(r[0] > 0.0 && r[0] < r[1]) {
                bail!("{} must satisfy 0 < low < high", name);
            }
        }

        if self.trend.min_points < 3 {
            bail!("trend.min_points must be at least 3");
        }
        let max_eta = self.trend.max_eta_weeks;
        if !(max_eta > 0.0 && max_eta <= f64::from(MAX_HORIZON_WEEKS)) {
            bail!(
                "trend.max_eta_weeks must be in (0, {}]",
                MAX_HORIZON_WEEKS
            );
        }
        if self.trend.horizons_weeks.iter().any(|w| *w == 0 || *w > MAX_HORIZON_WEEKS) {
            bail!(
                "trend.horizons_weeks must be between 1 and {}",
                MAX_HORIZON_WEEKS
            );
        }
        if !(self.trend.interval_level > 0.0 && self.trend.interval_level < 1.0) {
            bail!("trend.interval_level must be in (0, 1)");
        }
        if self.correlation.min_samples < 3 {
            bail!("correlation.min_samples must be at least 3");
        }
        if !(self.correlation.threshold > 0.0 && self.correlation.threshold < 1.0) {
            bail!("correlation.threshold must be in (0, 1)");
        }
        if self.live.channel_capacity == 0 {
            bail!("live.channel_capacity must be positive");
        }
        Ok(())
    }
}
