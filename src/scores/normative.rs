//! Age- and sex-stratified reference values.
//!
//! Gait speed follows Bohannon & Andrews (2011), TUG follows Bohannon
//! (2006). Cadence, stride length and double support use typical adult
//! ranges from gait-lab literature and are coarser (two age bands).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::math::stats::safe_ratio;
use crate::schema::v1::{ClinicalVariables, Sex, TestType, Variable};
use crate::scores::{NormClass, NormativeComparison};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormMetric {
    WalkSpeed,
    TugTime,
    Cadence,
    StrideLength,
    DoubleSupport,
}

impl NormMetric {
    pub const ALL: [NormMetric; 5] = [
        NormMetric::WalkSpeed,
        NormMetric::TugTime,
        NormMetric::Cadence,
        NormMetric::StrideLength,
        NormMetric::DoubleSupport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NormMetric::WalkSpeed => "walk_speed",
            NormMetric::TugTime => "tug_time",
            NormMetric::Cadence => "cadence",
            NormMetric::StrideLength => "stride_length",
            NormMetric::DoubleSupport => "double_support",
        }
    }

    /// Reference metric for a variable measured under a protocol. Speed
    /// norms only apply to straight-line walking and time norms only to TUG.
    pub fn for_variable(test_type: TestType, variable: Variable) -> Option<Self> {
        match (test_type, variable) {
            (TestType::TenMeterWalk, Variable::WalkSpeed) => Some(NormMetric::WalkSpeed),
            (TestType::Tug, Variable::WalkTime) => Some(NormMetric::TugTime),
            (TestType::BergBalance, _) => None,
            (_, Variable::Cadence) => Some(NormMetric::Cadence),
            (_, Variable::StrideLength) => Some(NormMetric::StrideLength),
            (_, Variable::DoubleSupport) => Some(NormMetric::DoubleSupport),
            _ => None,
        }
    }
}

impl fmt::Display for NormMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NormMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        NormMetric::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == key)
            .ok_or_else(|| format!("no normative data for '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormativeRange {
    pub mean: f64,
    pub sd: f64,
    pub range_low: f64,
    pub range_high: f64,
}

struct NormRow {
    metric: NormMetric,
    sex: Option<Sex>,
    age_min: u32,
    age_max: u32,
    mean: f64,
    sd: f64,
    low: f64,
    high: f64,
}

const fn row(
    metric: NormMetric,
    sex: Option<Sex>,
    age_min: u32,
    age_max: u32,
    mean: f64,
    sd: f64,
    low: f64,
    high: f64,
) -> NormRow {
    NormRow {
        metric,
        sex,
        age_min,
        age_max,
        mean,
        sd,
        low,
        high,
    }
}

const M: Option<Sex> = Some(Sex::Male);
/// Upper bound of the oldest bracket of every metric.
const OPEN: u32 = u32::MAX;
const F: Option<Sex> = Some(Sex::Female);

static TABLE: &[NormRow] = &[
    row(NormMetric::WalkSpeed, M, 20, 29, 1.358, 0.20, 1.16, 1.56),
    row(NormMetric::WalkSpeed, M, 30, 39, 1.433, 0.20, 1.23, 1.63),
    row(NormMetric::WalkSpeed, M, 40, 49, 1.434, 0.20, 1.23, 1.63),
    row(NormMetric::WalkSpeed, M, 50, 59, 1.433, 0.20, 1.23, 1.63),
    row(NormMetric::WalkSpeed, M, 60, 69, 1.339, 0.20, 1.14, 1.54),
    row(NormMetric::WalkSpeed, M, 70, 79, 1.262, 0.21, 1.05, 1.47),
    row(NormMetric::WalkSpeed, M, 80, OPEN, 0.968, 0.22, 0.75, 1.19),
    row(NormMetric::WalkSpeed, F, 20, 29, 1.341, 0.19, 1.15, 1.53),
    row(NormMetric::WalkSpeed, F, 30, 39, 1.337, 0.19, 1.15, 1.53),
    row(NormMetric::WalkSpeed, F, 40, 49, 1.390, 0.19, 1.20, 1.58),
    row(NormMetric::WalkSpeed, F, 50, 59, 1.400, 0.19, 1.21, 1.59),
    row(NormMetric::WalkSpeed, F, 60, 69, 1.300, 0.20, 1.10, 1.50),
    row(NormMetric::WalkSpeed, F, 70, 79, 1.241, 0.21, 1.03, 1.45),
    row(NormMetric::WalkSpeed, F, 80, OPEN, 0.943, 0.22, 0.72, 1.16),
    row(NormMetric::TugTime, None, 60, 69, 8.1, 1.6, 7.1, 9.0),
    row(NormMetric::TugTime, None, 70, 79, 9.2, 1.8, 8.2, 10.2),
    row(NormMetric::TugTime, None, 80, OPEN, 11.3, 2.6, 10.0, 12.7),
    row(NormMetric::Cadence, M, 20, 59, 110.0, 9.0, 101.0, 119.0),
    row(NormMetric::Cadence, F, 20, 59, 116.0, 9.0, 107.0, 125.0),
    row(NormMetric::Cadence, M, 60, OPEN, 108.0, 10.0, 98.0, 118.0),
    row(NormMetric::Cadence, F, 60, OPEN, 113.0, 10.0, 103.0, 123.0),
    row(NormMetric::StrideLength, M, 20, 59, 1.46, 0.12, 1.34, 1.58),
    row(NormMetric::StrideLength, F, 20, 59, 1.28, 0.11, 1.17, 1.39),
    row(NormMetric::StrideLength, M, 60, OPEN, 1.30, 0.14, 1.16, 1.44),
    row(NormMetric::StrideLength, F, 60, OPEN, 1.16, 0.12, 1.04, 1.28),
    row(NormMetric::DoubleSupport, None, 20, 59, 20.0, 3.5, 16.5, 23.5),
    row(NormMetric::DoubleSupport, None, 60, OPEN, 24.0, 4.0, 20.0, 28.0),
];

pub fn reference(metric: NormMetric, age: u32, sex: Sex) -> Option<NormativeRange> {
    TABLE
        .iter()
        .find(|r| {
            r.metric == metric
                && age >= r.age_min
                && age <= r.age_max
                && r.sex.is_none_or(|s| s == sex)
        })
        .map(|r| NormativeRange {
            mean: r.mean,
            sd: r.sd,
            range_low: r.low,
            range_high: r.high,
        })
}

pub fn classify(value: f64, range: &NormativeRange) -> NormativeComparison {
    let z_score = safe_ratio(value - range.mean, range.sd, 0.0);
    let comparison = if value >= range.range_low && value <= range.range_high {
        NormClass::Normal
    } else if z_score > 2.0 {
        NormClass::SignificantlyAbove
    } else if z_score < -2.0 {
        NormClass::SignificantlyBelow
    } else if value > range.range_high {
        NormClass::AboveAverage
    } else {
        NormClass::BelowAverage
    };
    NormativeComparison {
        comparison,
        z_score,
        percent_of_normal: safe_ratio(value, range.mean, 0.0) * 100.0,
        mean: range.mean,
        range_low: range.range_low,
        range_high: range.range_high,
    }
}

/// `None` when no reference exists for the metric, age or sex.
pub fn lookup(metric: NormMetric, value: f64, age: u32, sex: Sex) -> Option<NormativeComparison> {
    reference(metric, age, sex).map(|r| classify(value, &r))
}

/// Compares every variable of a test that has a reference. Walk time and
/// speed come from the test-level fields. Stride length is only compared
/// when it was measured in metres.
pub fn compare_test(
    test_type: TestType,
    walk_time_seconds: f64,
    walk_speed_mps: f64,
    variables: &ClinicalVariables,
    age: u32,
    sex: Sex,
) -> Vec<(Variable, NormativeComparison)> {
    let mut out = Vec::new();
    for variable in Variable::ALL {
        let Some(metric) = NormMetric::for_variable(test_type, variable) else {
            continue;
        };
        let value = match variable {
            Variable::WalkTime => Some(walk_time_seconds),
            Variable::WalkSpeed => Some(walk_speed_mps),
            Variable::StrideLength => variables
                .get(&variable)
                .filter(|v| v.unit == "m")
                .map(|v| v.value),
            _ => variables.get(&variable).map(|v| v.value),
        };
        if let Some(cmp) = value.and_then(|v| lookup(metric, v, age, sex)) {
            out.push((variable, cmp));
        }
    }
    out
}
