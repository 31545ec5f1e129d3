pub mod confidence;
pub mod normative;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    VeryLow,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            ConfidenceLevel::High
        } else if score >= 50.0 {
            ConfidenceLevel::Medium
        } else if score >= 20.0 {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::VeryLow
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::VeryLow => "very_low",
        }
    }
}

/// Sub-scores, each 0..100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceDetails {
    pub pose_detection_rate: f64,
    pub walk_duration_score: f64,
    pub walk_time_score: f64,
    pub walk_speed_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    pub score: f64,
    pub level: ConfidenceLevel,
    pub details: ConfidenceDetails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormClass {
    SignificantlyBelow,
    BelowAverage,
    Normal,
    AboveAverage,
    SignificantlyAbove,
}

impl NormClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            NormClass::SignificantlyBelow => "significantly_below",
            NormClass::BelowAverage => "below_average",
            NormClass::Normal => "normal",
            NormClass::AboveAverage => "above_average",
            NormClass::SignificantlyAbove => "significantly_above",
        }
    }
}

/// A value placed against its age/sex reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormativeComparison {
    pub comparison: NormClass,
    pub z_score: f64,
    pub percent_of_normal: f64,
    pub mean: f64,
    pub range_low: f64,
    pub range_high: f64,
}
