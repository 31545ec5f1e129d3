use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::gait::zone::ZoneWindow;
use crate::phases::PhaseSegmentation;
use crate::scores::{ConfidenceScore, NormativeComparison};

pub const TOOL_NAME: &str = "kira-gaitqc";
pub const SCHEMA_VERSION: &str = "v1";

/// Supported test protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TestType {
    #[serde(rename = "tug")]
    Tug,
    #[serde(rename = "10mwt")]
    TenMeterWalk,
    #[serde(rename = "bbs")]
    BergBalance,
}

impl TestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestType::Tug => "tug",
            TestType::TenMeterWalk => "10mwt",
            TestType::BergBalance => "bbs",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TestType::Tug => "TUG",
            TestType::TenMeterWalk => "10MWT",
            TestType::BergBalance => "BBS",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

/// Clinical variables tracked across tests. `WalkSpeed` and `WalkTime`
/// mirror the test-level fields so history queries can treat all series
/// uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    WalkSpeed,
    WalkTime,
    Cadence,
    StepTime,
    StrideTime,
    StrideLength,
    DoubleSupport,
    TrunkInclination,
    TrunkSway,
    ArmSwing,
    FootClearance,
}

impl Variable {
    pub const ALL: [Variable; 11] = [
        Variable::WalkSpeed,
        Variable::WalkTime,
        Variable::Cadence,
        Variable::StepTime,
        Variable::StrideTime,
        Variable::StrideLength,
        Variable::DoubleSupport,
        Variable::TrunkInclination,
        Variable::TrunkSway,
        Variable::ArmSwing,
        Variable::FootClearance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variable::WalkSpeed => "walk_speed",
            Variable::WalkTime => "walk_time",
            Variable::Cadence => "cadence",
            Variable::StepTime => "step_time",
            Variable::StrideTime => "stride_time",
            Variable::StrideLength => "stride_length",
            Variable::DoubleSupport => "double_support",
            Variable::TrunkInclination => "trunk_inclination",
            Variable::TrunkSway => "trunk_sway",
            Variable::ArmSwing => "arm_swing",
            Variable::FootClearance => "foot_clearance",
        }
    }

    /// Whether a larger value indicates better walking ability.
    /// `None` for variables without a clinical direction.
    pub fn higher_is_better(&self) -> Option<bool> {
        match self {
            Variable::WalkSpeed | Variable::Cadence | Variable::StrideLength => Some(true),
            Variable::FootClearance | Variable::ArmSwing => Some(true),
            Variable::WalkTime | Variable::DoubleSupport | Variable::TrunkSway => Some(false),
            Variable::StepTime
            | Variable::StrideTime
            | Variable::TrunkInclination => None,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        Variable::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == key)
            .ok_or_else(|| format!("unknown variable '{}'", s))
    }
}

/// A named metric computed once per test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalVariable {
    pub value: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asymmetry_index: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_steps: Option<u32>,
}

impl ClinicalVariable {
    pub fn new(value: f64, unit: &str) -> Self {
        Self {
            value,
            unit: unit.to_string(),
            sd: None,
            cv: None,
            left_mean: None,
            right_mean: None,
            asymmetry_index: None,
            total_steps: None,
        }
    }

    pub fn with_sd(mut self, sd: f64) -> Self {
        self.sd = Some(sd);
        self
    }

    pub fn with_cv(mut self, cv: f64) -> Self {
        self.cv = Some(cv);
        self
    }

    pub fn with_sides(mut self, left: Option<f64>, right: Option<f64>) -> Self {
        self.left_mean = left;
        self.right_mean = right;
        if let (Some(l), Some(r)) = (left, right) {
            self.asymmetry_index = Some(crate::math::stats::asymmetry_index(l, r));
        }
        self
    }

    pub fn with_total_steps(mut self, steps: u32) -> Self {
        self.total_steps = Some(steps);
        self
    }
}

pub type ClinicalVariables = BTreeMap<Variable, ClinicalVariable>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMeta {
    pub total: u64,
    pub detected: u64,
    pub dropped: u64,
    pub duration_s: f64,
    pub fps: Option<f64>,
}

/// Test-shaped analysis result handed to persistence and presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaitQcV1 {
    pub tool: String,
    pub version: String,
    pub schema_version: String,
    pub file_id: Option<String>,
    pub test_type: TestType,
    pub walk_time_seconds: f64,
    pub walk_speed_mps: f64,
    /// Clinician-entered BBS score carried with the analysis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    pub frames: FrameMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phases: Option<PhaseSegmentation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<ZoneWindow>,
    pub clinical_variables: ClinicalVariables,
    pub confidence: ConfidenceScore,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normative: Option<BTreeMap<Variable, NormativeComparison>>,
    #[serde(default)]
    pub warnings: Vec<String>,
}
