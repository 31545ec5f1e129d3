use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TrendConfig;
use crate::math::regression::{LinearFit, fit_linear};
use crate::math::stats::round_to;
use crate::schema::v1::Variable;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub date: NaiveDate,
    pub weeks_ahead: u32,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalEta {
    pub target: f64,
    pub already_met: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weeks_remaining: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub variable: Variable,
    pub sufficient_data: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data_points: Vec<TrendPoint>,
    #[serde(default)]
    pub predictions: Vec<Prediction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slope_per_week: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slope_std_error_per_week: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r_squared: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_error: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<TrendDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_eta: Option<GoalEta>,
}

impl TrendResult {
    fn insufficient(variable: Variable, data_points: Vec<TrendPoint>, message: String) -> Self {
        Self {
            variable,
            sufficient_data: false,
            message: Some(message),
            data_points,
            predictions: Vec::new(),
            slope_per_week: None,
            slope_std_error_per_week: None,
            r_squared: None,
            std_error: None,
            direction: None,
            goal_eta: None,
        }
    }
}

/// Fits a linear trend of `value` against days since the first
/// measurement and forecasts the configured horizons.
pub fn analyze_trend(
    series: &[(NaiveDate, f64)],
    variable: Variable,
    goal: Option<f64>,
    cfg: &TrendConfig,
) -> Result<TrendResult> {
    let mut data_points: Vec<TrendPoint> = series
        .iter()
        .filter(|(_, v)| v.is_finite())
        .map(|&(date, value)| TrendPoint { date, value })
        .collect();
    data_points.sort_by_key(|p| p.date);

    let n = data_points.len();
    if n < cfg.min_points {
        return Ok(TrendResult::insufficient(
            variable,
            data_points,
            format!(
                "at least {} measurements are needed for a trend, found {}",
                cfg.min_points, n
            ),
        ));
    }

    let first = data_points[0].date;
    let last = data_points[n - 1].date;
    let x: Vec<f64> = data_points
        .iter()
        .map(|p| (p.date - first).num_days() as f64)
        .collect();
    let y: Vec<f64> = data_points.iter().map(|p| p.value).collect();
    let Some(fit) = fit_linear(&x, &y) else {
        return Ok(TrendResult::insufficient(
            variable,
            data_points,
            "all measurements share the same date".to_string(),
        ));
    };

    let mut predictions = Vec::with_capacity(cfg.horizons_weeks.len());
    for &weeks in &cfg.horizons_weeks {
        let date = last
            .checked_add_signed(Duration::days(7 * i64::from(weeks)))
            .with_context(|| format!("forecast horizon of {} weeks is out of range", weeks))?;
        let xf = (date - first).num_days() as f64;
        let value = fit.predict(xf);
        let half = fit.prediction_half_width(xf, cfg.interval_level)?;
        predictions.push(Prediction {
            date,
            weeks_ahead: weeks,
            value,
            lower: value - half,
            upper: value + half,
        });
    }

    let slope_per_week = fit.slope * 7.0;
    let slope_se_week = fit.slope_std_error * 7.0;
    let x_last = (last - first).num_days() as f64;
    let goal_eta = goal.map(|target| estimate_goal(&fit, first, x_last, target, variable, cfg));
    debug!(
        variable = variable.as_str(),
        n,
        slope_per_week,
        r_squared = fit.r_squared,
        "trend fitted"
    );

    Ok(TrendResult {
        variable,
        sufficient_data: true,
        message: None,
        data_points,
        predictions,
        slope_per_week: Some(slope_per_week),
        slope_std_error_per_week: Some(slope_se_week),
        r_squared: Some(fit.r_squared),
        std_error: Some(fit.residual_std_error),
        direction: direction(variable, slope_per_week, slope_se_week),
        goal_eta,
    })
}

/// Improving or declining only when the slope exceeds one standard error.
fn direction(variable: Variable, slope: f64, slope_se: f64) -> Option<TrendDirection> {
    let higher_is_better = variable.higher_is_better()?;
    if slope == 0.0 || slope.abs() <= slope_se {
        return Some(TrendDirection::Stable);
    }
    if (slope > 0.0) == higher_is_better {
        Some(TrendDirection::Improving)
    } else {
        Some(TrendDirection::Declining)
    }
}

/// Date at which the fitted line reaches `target`, measured from the last
/// fitted value.
pub fn estimate_goal(
    fit: &LinearFit,
    first: NaiveDate,
    x_last: f64,
    target: f64,
    variable: Variable,
    cfg: &TrendConfig,
) -> GoalEta {
    let current = fit.predict(x_last);
    let needed = target - current;
    let already_met = match variable.higher_is_better() {
        Some(true) => needed <= 0.0,
        Some(false) => needed >= 0.0,
        None => needed == 0.0,
    };
    let mut eta = GoalEta {
        target,
        already_met,
        eta_date: None,
        weeks_remaining: None,
        message: None,
    };
    if already_met {
        eta.weeks_remaining = Some(0.0);
        eta.message = Some("goal already met".to_string());
        return eta;
    }
    if fit.slope == 0.0 {
        eta.message = Some("no change over time; goal cannot be projected".to_string());
        return eta;
    }
    if fit.slope.signum() != needed.signum() {
        eta.message = Some("current trend is moving away from the goal".to_string());
        return eta;
    }
    let x_goal = (target - fit.intercept) / fit.slope;
    let weeks = (x_goal - x_last) / 7.0;
    if weeks > cfg.max_eta_weeks {
        eta.message = Some(format!(
            "goal not expected within {} weeks at the current rate",
            cfg.max_eta_weeks
        ));
        return eta;
    }
    eta.eta_date = first.checked_add_signed(Duration::days(x_goal.ceil() as i64));
    eta.weeks_remaining = Some(round_to(weeks, 1));
    eta
}
