use serde::{Deserialize, Serialize};

use crate::config::CorrelationConfig;
use crate::history::HistoricalTest;
use crate::math::regression::correlation_p_value;
use crate::math::stats::pearson;
use crate::schema::v1::Variable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    Strong,
    Moderate,
    Weak,
}

impl Strength {
    pub fn from_r(r: f64) -> Self {
        let a = r.abs();
        if a >= 0.7 {
            Strength::Strong
        } else if a >= 0.5 {
            Strength::Moderate
        } else {
            Strength::Weak
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub var1: Variable,
    pub var2: Variable,
    pub r: f64,
    pub p_value: f64,
    pub n: usize,
    pub strength: Strength,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedCorrelation {
    pub variable: Variable,
    pub r: f64,
    pub p_value: f64,
    pub n: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub sufficient_data: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub n_tests: usize,
    pub variables: Vec<Variable>,
    /// Symmetric, unit diagonal, indexed like `variables`.
    pub correlation_matrix: Vec<Vec<f64>>,
    pub significant_correlations: Vec<CorrelationPair>,
    pub speed_correlations: Vec<SpeedCorrelation>,
}

impl CorrelationResult {
    fn insufficient(n_tests: usize, message: String) -> Self {
        Self {
            sufficient_data: false,
            message: Some(message),
            n_tests,
            variables: Vec::new(),
            correlation_matrix: Vec::new(),
            significant_correlations: Vec::new(),
            speed_correlations: Vec::new(),
        }
    }

    pub fn r(&self, a: Variable, b: Variable) -> Option<f64> {
        let i = self.variables.iter().position(|v| *v == a)?;
        let j = self.variables.iter().position(|v| *v == b)?;
        Some(self.correlation_matrix[i][j])
    }
}

/// Values of two variables on the tests where both are present.
fn paired(tests: &[&HistoricalTest], a: Variable, b: Variable) -> (Vec<f64>, Vec<f64>) {
    tests
        .iter()
        .filter_map(|t| Some((t.value_of(a)?, t.value_of(b)?)))
        .unzip()
}

/// Pearson correlation across every pair of variables with at least
/// `min_samples` observations. Pairs below `min_samples` paired values
/// are reported as r = 0.
pub fn analyze_correlations(tests: &[&HistoricalTest], cfg: &CorrelationConfig) -> CorrelationResult {
    let n_tests = tests.len();
    if n_tests < cfg.min_samples {
        return CorrelationResult::insufficient(
            n_tests,
            format!(
                "at least {} tests are needed for correlation analysis, found {}",
                cfg.min_samples, n_tests
            ),
        );
    }
    let variables: Vec<Variable> = Variable::ALL
        .iter()
        .copied()
        .filter(|v| tests.iter().filter(|t| t.value_of(*v).is_some()).count() >= cfg.min_samples)
        .collect();
    if variables.len() < 2 {
        return CorrelationResult::insufficient(
            n_tests,
            "fewer than two variables have enough observations".to_string(),
        );
    }

    let k = variables.len();
    let mut matrix = vec![vec![0.0; k]; k];
    let mut pairs = Vec::new();
    for i in 0..k {
        matrix[i][i] = 1.0;
        for j in (i + 1)..k {
            let (x, y) = paired(tests, variables[i], variables[j]);
            let n = x.len();
            let r = if n >= cfg.min_samples { pearson(&x, &y) } else { 0.0 };
            matrix[i][j] = r;
            matrix[j][i] = r;
            if n >= cfg.min_samples {
                pairs.push((i, j, r, n));
            }
        }
    }

    let mut significant: Vec<CorrelationPair> = pairs
        .iter()
        .filter(|(_, _, r, _)| r.abs() >= cfg.threshold)
        .map(|&(i, j, r, n)| CorrelationPair {
            var1: variables[i],
            var2: variables[j],
            r,
            p_value: correlation_p_value(r, n),
            n,
            strength: Strength::from_r(r),
            direction: if r >= 0.0 {
                Direction::Positive
            } else {
                Direction::Negative
            },
        })
        .collect();
    significant.sort_by(|a, b| b.r.abs().total_cmp(&a.r.abs()));

    let mut speed: Vec<SpeedCorrelation> = match variables.iter().position(|v| *v == Variable::WalkSpeed) {
        Some(s) => pairs
            .iter()
            .filter(|(i, j, _, _)| *i == s || *j == s)
            .map(|&(i, j, r, n)| SpeedCorrelation {
                variable: if i == s { variables[j] } else { variables[i] },
                r,
                p_value: correlation_p_value(r, n),
                n,
            })
            .collect(),
        None => Vec::new(),
    };
    speed.sort_by(|a, b| b.r.abs().total_cmp(&a.r.abs()));

    CorrelationResult {
        sufficient_data: true,
        message: None,
        n_tests,
        variables,
        correlation_matrix: matrix,
        significant_correlations: significant,
        speed_correlations: speed,
    }
}
