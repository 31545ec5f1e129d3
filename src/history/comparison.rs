use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::history::{HistoricalTest, PatientHistory};
use crate::math::stats::{round_to, safe_ratio};
use crate::schema::v1::TestType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryOutcome {
    WalkTime,
    WalkSpeed,
    Score,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub test_type: TestType,
    pub previous_date: NaiveDate,
    pub current_date: NaiveDate,
    /// current - previous, seconds.
    pub time_difference: f64,
    /// current - previous, m/s.
    pub speed_difference: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_difference: Option<i64>,
    pub primary_outcome: PrimaryOutcome,
    /// Relative change of the primary outcome, positive when better.
    pub improvement_pct: f64,
    pub is_improved: bool,
    pub summary_text: String,
}

/// Compares a test with its predecessor. Both must share a protocol.
pub fn compare(previous: &HistoricalTest, current: &HistoricalTest) -> Result<ComparisonResult> {
    if previous.test_type != current.test_type {
        bail!(
            "cannot compare a {} test with a {} test",
            previous.test_type,
            current.test_type
        );
    }
    let test_type = current.test_type;
    let time_difference = round_to(current.walk_time_seconds - previous.walk_time_seconds, 3);
    let speed_difference = round_to(current.walk_speed_mps - previous.walk_speed_mps, 3);
    let score_difference = match (previous.score, current.score) {
        (Some(a), Some(b)) => Some(i64::from(b) - i64::from(a)),
        _ => None,
    };

    let (primary_outcome, is_improved, improvement_pct) = match test_type {
        TestType::Tug => time_outcome(previous, current, time_difference),
        TestType::TenMeterWalk => {
            if speed_difference != 0.0 {
                (
                    PrimaryOutcome::WalkSpeed,
                    speed_difference > 0.0,
                    relative(current.walk_speed_mps - previous.walk_speed_mps, previous.walk_speed_mps),
                )
            } else {
                time_outcome(previous, current, time_difference)
            }
        }
        TestType::BergBalance => match (previous.score, score_difference) {
            (Some(prev), Some(diff)) => (
                PrimaryOutcome::Score,
                diff > 0,
                relative(diff as f64, f64::from(prev)),
            ),
            _ => time_outcome(previous, current, time_difference),
        },
    };

    let summary_text = summary(
        previous,
        current,
        time_difference,
        speed_difference,
        score_difference,
        is_improved,
        improvement_pct,
    );
    Ok(ComparisonResult {
        test_type,
        previous_date: previous.date,
        current_date: current.date,
        time_difference,
        speed_difference,
        score_difference,
        primary_outcome,
        improvement_pct,
        is_improved,
        summary_text,
    })
}

/// Lower time is better.
fn time_outcome(previous: &HistoricalTest, current: &HistoricalTest, diff: f64) -> (PrimaryOutcome, bool, f64) {
    (
        PrimaryOutcome::WalkTime,
        diff < 0.0,
        relative(previous.walk_time_seconds - current.walk_time_seconds, previous.walk_time_seconds),
    )
}

fn relative(change: f64, baseline: f64) -> f64 {
    round_to(safe_ratio(change, baseline, 0.0) * 100.0, 1)
}

/// The two most recent tests of `test_type`, or `None` with fewer than two.
pub fn compare_latest(history: &PatientHistory, test_type: TestType) -> Result<Option<ComparisonResult>> {
    let tests = history.of_type(test_type);
    match tests.as_slice() {
        [.., previous, current] => compare(previous, current).map(Some),
        _ => Ok(None),
    }
}

fn summary(
    previous: &HistoricalTest,
    current: &HistoricalTest,
    time_difference: f64,
    speed_difference: f64,
    score_difference: Option<i64>,
    is_improved: bool,
    improvement_pct: f64,
) -> String {
    let verdict = if is_improved {
        "improved"
    } else if improvement_pct == 0.0 && time_difference == 0.0 && speed_difference == 0.0 {
        "unchanged"
    } else {
        "did not improve"
    };
    let mut text = format!(
        "{} {} since {}: walk time {:.2} s -> {:.2} s ({:+.2} s)",
        current.test_type,
        verdict,
        previous.date,
        previous.walk_time_seconds,
        current.walk_time_seconds,
        time_difference
    );
    if current.test_type != TestType::BergBalance {
        text.push_str(&format!(
            ", speed {:.2} -> {:.2} m/s ({:+.2} m/s)",
            previous.walk_speed_mps, current.walk_speed_mps, speed_difference
        ));
    }
    if let (Some(a), Some(b), Some(d)) = (previous.score, current.score, score_difference) {
        text.push_str(&format!(", score {} -> {} ({:+})", a, b, d));
    }
    text.push_str(&format!(", {:+.1}% on the primary outcome.", improvement_pct));
    text
}
