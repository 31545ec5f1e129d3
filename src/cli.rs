use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::schema::v1::{Sex, TestType, Variable};
use crate::scores::normative::NormMetric;

#[derive(Debug, Parser)]
#[command(
    name = "kira-gaitqc",
    version,
    about = "Gait analysis and clinical statistics for walking tests"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Analyse one recorded test.
    Analyze(AnalyzeArgs),
    /// Segment a TUG in real time from JSON Lines frames.
    Live(LiveArgs),
    /// Fit a trend to one variable across a patient's tests.
    Trend(TrendArgs),
    /// Correlate clinical variables across a patient's tests.
    Correlate(CorrelateArgs),
    /// Compare the two most recent tests of a protocol.
    Compare(CompareArgs),
    /// Trend, correlation and comparison in one document.
    Report(ReportArgs),
    /// Classify a value against age- and sex-matched norms.
    Norms(NormsArgs),
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[arg(long, help = "Landmark file (.json, .jsonl, optionally .gz)")]
    pub input: PathBuf,

    #[arg(long, value_enum)]
    pub test_type: TestTypeArg,

    #[arg(long)]
    pub out: PathBuf,

    #[arg(long, help = "TOML file overriding detection thresholds")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Patient height; enables metric stride length")]
    pub height_cm: Option<f64>,

    #[arg(long)]
    pub age: Option<u32>,

    #[arg(long, value_enum)]
    pub sex: Option<SexArg>,

    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=56), help = "Clinician-entered BBS score")]
    pub score: Option<u32>,

    #[arg(long)]
    pub file_id: Option<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[arg(long, default_value_t = false)]
    pub tsv: bool,

    #[arg(
        long,
        default_value_t = false,
        help = "Print progress events as JSON Lines instead of a summary"
    )]
    pub events: bool,
}

#[derive(Debug, Args)]
pub struct LiveArgs {
    #[arg(long, help = "JSON Lines frame source, '-' for stdin")]
    pub input: PathBuf,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, default_value = "live")]
    pub file_id: String,
}

#[derive(Debug, Args)]
pub struct TrendArgs {
    #[arg(long, help = "Patient history JSON")]
    pub history: PathBuf,

    #[arg(long, value_enum)]
    pub test_type: TestTypeArg,

    #[arg(long, value_parser = parse_variable)]
    pub variable: Variable,

    #[arg(long, help = "Target value for the goal estimate")]
    pub goal: Option<f64>,

    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CorrelateArgs {
    #[arg(long)]
    pub history: PathBuf,

    #[arg(long, value_enum)]
    pub test_type: TestTypeArg,

    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    #[arg(long)]
    pub history: PathBuf,

    #[arg(long, value_enum)]
    pub test_type: TestTypeArg,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[arg(long)]
    pub history: PathBuf,

    #[arg(long, value_enum)]
    pub test_type: TestTypeArg,

    #[arg(long = "goal", value_parser = parse_goal, help = "Goal as VARIABLE=VALUE (repeatable)")]
    pub goals: Vec<(Variable, f64)>,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, default_value_t = 0, help = "Number of threads (0 = auto)")]
    pub threads: usize,
}

#[derive(Debug, Args)]
pub struct NormsArgs {
    #[arg(long, value_parser = parse_metric, help = "walk_speed|tug_time|cadence|stride_length|double_support")]
    pub variable: NormMetric,

    #[arg(long)]
    pub value: f64,

    #[arg(long)]
    pub age: u32,

    #[arg(long, value_enum)]
    pub sex: SexArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestTypeArg {
    Tug,
    #[value(name = "10mwt")]
    TenMeterWalk,
    Bbs,
}

impl From<TestTypeArg> for TestType {
    fn from(arg: TestTypeArg) -> Self {
        match arg {
            TestTypeArg::Tug => TestType::Tug,
            TestTypeArg::TenMeterWalk => TestType::TenMeterWalk,
            TestTypeArg::Bbs => TestType::BergBalance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SexArg {
    Male,
    Female,
}

impl From<SexArg> for Sex {
    fn from(arg: SexArg) -> Self {
        match arg {
            SexArg::Male => Sex::Male,
            SexArg::Female => Sex::Female,
        }
    }
}

fn parse_variable(s: &str) -> Result<Variable, String> {
    s.parse()
}

fn parse_metric(s: &str) -> Result<NormMetric, String> {
    s.parse()
}

fn parse_goal(s: &str) -> Result<(Variable, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected VARIABLE=VALUE, got '{}'", s))?;
    let variable: Variable = name.parse()?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid goal value '{}'", value))?;
    if !value.is_finite() {
        return Err(format!("goal for {} must be finite", variable));
    }
    Ok((variable, value))
}
