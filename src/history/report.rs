use std::collections::BTreeMap;

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

#[cfg(feature = "mt")]
use rayon::prelude::*;

use crate::config::Config;
use crate::history::comparison::{ComparisonResult, compare_latest};
use crate::history::correlation::{CorrelationResult, analyze_correlations};
use crate::history::PatientHistory;
use crate::history::trend::{TrendResult, analyze_trend};
use crate::schema::v1::{SCHEMA_VERSION, TOOL_NAME, TestType, Variable};

/// Trend, correlation and comparison for one protocol in a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryReport {
    pub tool: String,
    pub version: String,
    pub schema_version: String,
    pub patient_id: String,
    pub test_type: TestType,
    pub n_tests: usize,
    pub trends: Vec<TrendResult>,
    pub correlation: CorrelationResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonResult>,
}

/// Builds the report. Trends are independent per variable and run in
/// parallel on `threads` workers (0 = rayon default) when `mt` is enabled.
pub fn build_report(
    history: &PatientHistory,
    test_type: TestType,
    goals: &BTreeMap<Variable, f64>,
    cfg: &Config,
    threads: usize,
) -> Result<HistoryReport> {
    let tests = history.of_type(test_type);
    let series: Vec<(Variable, Vec<(NaiveDate, f64)>)> = Variable::ALL
        .iter()
        .map(|&v| (v, history.series(test_type, v)))
        .filter(|(_, s)| !s.is_empty())
        .collect();

    let run = |(variable, points): &(Variable, Vec<(NaiveDate, f64)>)| {
        analyze_trend(points, *variable, goals.get(variable).copied(), &cfg.trend)
    };

    #[cfg(feature = "mt")]
    let trends: Result<Vec<TrendResult>> = {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if threads > 0 {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build thread pool: {}", e))?;
        pool.install(|| series.par_iter().map(run).collect())
    };
    #[cfg(not(feature = "mt"))]
    let trends: Result<Vec<TrendResult>> = {
        let _ = threads;
        series.iter().map(run).collect()
    };
    let trends = trends?;

    let correlation = analyze_correlations(&tests, &cfg.correlation);
    let comparison = compare_latest(history, test_type)?;
    info!(
        patient_id = %history.patient_id,
        test_type = test_type.as_str(),
        n_tests = tests.len(),
        trends = trends.len(),
        "history report built"
    );

    Ok(HistoryReport {
        tool: TOOL_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        patient_id: history.patient_id.clone(),
        test_type,
        n_tests: tests.len(),
        trends,
        correlation,
        comparison,
    })
}
