//! Cross-test statistics over a patient's stored tests.
//!
//! Everything here is a pure function of a [`PatientHistory`] snapshot.

pub mod comparison;
pub mod correlation;
pub mod report;
pub mod trend;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::schema::v1::{ClinicalVariables, GaitQcV1, Sex, TestType, Variable};

/// A persisted test as the history queries see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalTest {
    pub date: NaiveDate,
    pub test_type: TestType,
    pub walk_time_seconds: f64,
    pub walk_speed_mps: f64,
    /// Clinician-entered BBS score (0..56).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(default)]
    pub clinical_variables: ClinicalVariables,
}

impl HistoricalTest {
    pub fn from_report(report: &GaitQcV1, date: NaiveDate) -> Self {
        Self {
            date,
            test_type: report.test_type,
            walk_time_seconds: report.walk_time_seconds,
            walk_speed_mps: report.walk_speed_mps,
            score: report.score,
            clinical_variables: report.clinical_variables.clone(),
        }
    }

    /// Value of a variable on this test; test-level fields back `walk_time`
    /// and `walk_speed`. Non-finite values count as missing.
    pub fn value_of(&self, variable: Variable) -> Option<f64> {
        let value = match variable {
            Variable::WalkTime => Some(self.walk_time_seconds),
            Variable::WalkSpeed => Some(self.walk_speed_mps),
            other => self.clinical_variables.get(&other).map(|v| v.value),
        };
        value.filter(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientHistory {
    pub patient_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub tests: Vec<HistoricalTest>,
}

impl PatientHistory {
    /// Orders tests by date; same-day tests keep their stored order.
    pub fn sort_by_date(&mut self) {
        self.tests.sort_by_key(|t| t.date);
    }

    /// Tests of one protocol, oldest first whatever the stored order.
    /// Tests on the same date keep their stored order.
    pub fn of_type(&self, test_type: TestType) -> Vec<&HistoricalTest> {
        let mut tests: Vec<&HistoricalTest> =
            self.tests.iter().filter(|t| t.test_type == test_type).collect();
        tests.sort_by_key(|t| t.date);
        tests
    }

    /// Dated values of one variable for one protocol, oldest first.
    pub fn series(&self, test_type: TestType, variable: Variable) -> Vec<(NaiveDate, f64)> {
        self.of_type(test_type)
            .into_iter()
            .filter_map(|t| t.value_of(variable).map(|v| (t.date, v)))
            .collect()
    }
}
