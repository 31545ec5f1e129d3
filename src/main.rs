use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{BufReader, Write};
use std::path::Path;
use std::sync::mpsc::sync_channel;
use std::thread;
use tracing_subscriber::EnvFilter;

use kira_gaitqc::cli::{
    AnalyzeArgs, Cli, Commands, CompareArgs, CorrelateArgs, LiveArgs, NormsArgs, ReportArgs,
    TrendArgs,
};
use kira_gaitqc::config::Config;
use kira_gaitqc::ctx::{Ctx, PatientInfo};
use kira_gaitqc::history::comparison::compare_latest;
use kira_gaitqc::history::correlation::analyze_correlations;
use kira_gaitqc::history::report::build_report;
use kira_gaitqc::history::trend::analyze_trend;
use kira_gaitqc::input::read_history;
use kira_gaitqc::io;
use kira_gaitqc::pipeline::Pipeline;
use kira_gaitqc::schema::v1::{GaitQcV1, TestType};
use kira_gaitqc::scores::normative::lookup;
use kira_gaitqc::stream::job::{JobOutcome, NullSink, ReportFileSink, TestSink, spawn_analysis};
use kira_gaitqc::stream::live::{run_live, spawn_frame_reader};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => handle_analyze(args)?,
        Commands::Live(args) => handle_live(args)?,
        Commands::Trend(args) => handle_trend(args)?,
        Commands::Correlate(args) => handle_correlate(args)?,
        Commands::Compare(args) => handle_compare(args)?,
        Commands::Report(args) => handle_report(args)?,
        Commands::Norms(args) => handle_norms(args)?,
    }
    Ok(())
}

fn handle_analyze(args: AnalyzeArgs) -> Result<()> {
    let config = Config::load_or_default(args.config.as_deref())?;
    let test_type = TestType::from(args.test_type);
    let file_id = args.file_id.clone().unwrap_or_else(|| file_stem(&args.input));
    let mut ctx = Ctx::new(
        Some(args.input),
        args.out,
        test_type,
        config,
        args.json,
        args.tsv,
    );
    ctx.patient = PatientInfo {
        height_cm: args.height_cm,
        age: args.age,
        sex: args.sex.map(Into::into),
        score: args.score,
    };

    if args.events {
        // The job persists the report files itself, and only on success.
        let files = ReportFileSink::for_ctx(&ctx);
        let sink: Box<dyn TestSink> = if files.is_empty() {
            Box::new(NullSink)
        } else {
            Box::new(files)
        };
        ctx.write_json = false;
        ctx.write_tsv = false;
        let handle = spawn_analysis(ctx, file_id, sink)?;
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for event in handle.events().iter() {
            writeln!(out, "{}", event.to_json_line()?)?;
        }
        let (_, outcome) = handle.wait()?;
        return match outcome {
            JobOutcome::Completed(_) => Ok(()),
            JobOutcome::Cancelled => bail!("analysis cancelled"),
            JobOutcome::Failed(message) => Err(anyhow!(message)),
        };
    }

    ctx.file_id = Some(file_id);
    Pipeline::analysis().run(&mut ctx)?;
    let report = ctx.report.as_ref().context("analysis produced no report")?;
    print_summary(report);
    Ok(())
}

fn handle_live(args: LiveArgs) -> Result<()> {
    let config = Config::load_or_default(args.config.as_deref())?;
    let capacity = config.live.channel_capacity;
    let (frames, reader) = if args.input.as_os_str() == "-" {
        spawn_frame_reader(BufReader::new(std::io::stdin()), capacity)?
    } else {
        let source = io::open_maybe_gz(&args.input)?;
        spawn_frame_reader(BufReader::new(source), capacity)?
    };

    let (tx, events) = sync_channel(capacity);
    let worker = thread::Builder::new()
        .name("gaitqc-live".to_string())
        .spawn(move || run_live(&frames, &tx, &config, &args.file_id))
        .context("failed to spawn live worker")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for event in events.iter() {
        writeln!(out, "{}", event.to_json_line()?)?;
        out.flush()?;
    }

    worker
        .join()
        .map_err(|_| anyhow!("live worker panicked"))??;
    let forwarded = reader
        .join()
        .map_err(|_| anyhow!("frame reader panicked"))??;
    tracing::info!(frames = forwarded, "live input exhausted");
    Ok(())
}

fn handle_trend(args: TrendArgs) -> Result<()> {
    let config = Config::load_or_default(args.config.as_deref())?;
    let history = read_history(&args.history)?;
    let test_type = TestType::from(args.test_type);
    let series = history.series(test_type, args.variable);
    let result = analyze_trend(&series, args.variable, args.goal, &config.trend)?;
    print_json(&result)
}

fn handle_correlate(args: CorrelateArgs) -> Result<()> {
    let config = Config::load_or_default(args.config.as_deref())?;
    let history = read_history(&args.history)?;
    let tests = history.of_type(TestType::from(args.test_type));
    let result = analyze_correlations(&tests, &config.correlation);
    print_json(&result)
}

fn handle_compare(args: CompareArgs) -> Result<()> {
    let history = read_history(&args.history)?;
    let test_type = TestType::from(args.test_type);
    match compare_latest(&history, test_type)? {
        Some(result) => print_json(&result),
        None => bail!(
            "patient {} has fewer than two {} tests to compare",
            history.patient_id,
            test_type
        ),
    }
}

fn handle_report(args: ReportArgs) -> Result<()> {
    let config = Config::load_or_default(args.config.as_deref())?;
    let history = read_history(&args.history)?;
    let goals: BTreeMap<_, _> = args.goals.into_iter().collect();
    let report = build_report(
        &history,
        TestType::from(args.test_type),
        &goals,
        &config,
        args.threads,
    )?;
    print_json(&report)
}

fn handle_norms(args: NormsArgs) -> Result<()> {
    let comparison = lookup(args.variable, args.value, args.age, args.sex.into())
        .with_context(|| {
            format!(
                "no normative data for {} at age {}",
                args.variable, args.age
            )
        })?;
    print_json(&comparison)
}

fn print_summary(report: &GaitQcV1) {
    print!("{}", io::summary::format_summary(report));
    if !report.warnings.is_empty() {
        println!("warnings:");
        for warning in &report.warnings {
            println!("- {}", warning);
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn file_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("input");
    let name = name.strip_suffix(".gz").unwrap_or(name);
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("input")
        .to_string()
}
