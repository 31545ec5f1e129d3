mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use kira_gaitqc::config::Config;
use kira_gaitqc::ctx::Ctx;
use kira_gaitqc::schema::v1::{GaitQcV1, TestType};
use kira_gaitqc::stream::events::{CompletedResult, StreamEvent};
use kira_gaitqc::stream::job::{JobOutcome, NullSink, ReportFileSink, TestSink, spawn_analysis};
use tempfile::TempDir;

use common::{empty_frames, tug_frames};

struct CountingSink(Arc<AtomicUsize>);

impl TestSink for CountingSink {
    fn persist(&mut self, _report: &GaitQcV1) -> Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn small_channel() -> Config {
    let mut cfg = Config::default();
    cfg.live.channel_capacity = 1;
    cfg
}

#[test]
fn job_reports_progress_then_completes() {
    let calls = Arc::new(AtomicUsize::new(0));
    let ctx = Ctx::from_frames(tug_frames(), TestType::Tug, Config::default());
    let handle = spawn_analysis(ctx, "tug-1".to_string(), Box::new(CountingSink(calls.clone()))).unwrap();
    let (events, outcome) = handle.wait().unwrap();

    let JobOutcome::Completed(report) = outcome else {
        panic!("job did not complete: {:?}", outcome);
    };
    assert_eq!(report.file_id.as_deref(), Some("tug-1"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let progress: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Progress { progress, .. } => Some(*progress),
            _ => None,
        })
        .collect();
    assert!(progress.len() >= 2);
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*progress.last().unwrap(), 100);

    let last = events.last().unwrap();
    assert!(last.is_terminal());
    match last {
        StreamEvent::Completed {
            file_id,
            result: CompletedResult::Test(done),
        } => {
            assert_eq!(file_id, "tug-1");
            assert_eq!(done.test_type, TestType::Tug);
        }
        other => panic!("unexpected final event {:?}", other),
    }
}

#[test]
fn disconnect_cancels_without_persisting() {
    let calls = Arc::new(AtomicUsize::new(0));
    let ctx = Ctx::from_frames(tug_frames(), TestType::Tug, small_channel());
    let handle = spawn_analysis(ctx, "gone".to_string(), Box::new(CountingSink(calls.clone()))).unwrap();
    let outcome = handle.disconnect().unwrap();
    assert_eq!(outcome, JobOutcome::Cancelled);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn cancel_flag_stops_the_job() {
    let calls = Arc::new(AtomicUsize::new(0));
    let ctx = Ctx::from_frames(tug_frames(), TestType::Tug, small_channel());
    let handle = spawn_analysis(ctx, "stop".to_string(), Box::new(CountingSink(calls.clone()))).unwrap();
    handle.cancel();
    let (events, outcome) = handle.wait().unwrap();
    assert_eq!(outcome, JobOutcome::Cancelled);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!events.iter().any(|e| e.is_terminal()));
}

#[test]
fn failed_job_emits_error_event() {
    let ctx = Ctx::from_frames(empty_frames(2.0), TestType::TenMeterWalk, Config::default());
    let handle = spawn_analysis(ctx, "blank".to_string(), Box::new(NullSink)).unwrap();
    let (events, outcome) = handle.wait().unwrap();

    let JobOutcome::Failed(message) = outcome else {
        panic!("expected failure, got {:?}", outcome);
    };
    assert!(message.contains("no usable frames"));
    match events.last().unwrap() {
        StreamEvent::Error { file_id, message } => {
            assert_eq!(file_id, "blank");
            assert!(message.contains("no usable frames"));
        }
        other => panic!("unexpected final event {:?}", other),
    }
}

#[test]
fn file_sink_writes_json_and_tsv() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("results");
    let ctx = Ctx::new(None, out.clone(), TestType::Tug, Config::default(), true, true);
    let sink = ReportFileSink::for_ctx(&ctx);
    assert!(!sink.is_empty());
    let mut ctx = ctx;
    ctx.frames = tug_frames();
    let handle = spawn_analysis(ctx, "walk".to_string(), Box::new(sink)).unwrap();
    let (_, outcome) = handle.wait().unwrap();
    assert!(matches!(outcome, JobOutcome::Completed(_)));

    let text = std::fs::read_to_string(out.join("gaitqc.json")).unwrap();
    let stored: GaitQcV1 = serde_json::from_str(&text).unwrap();
    assert_eq!(stored.file_id.as_deref(), Some("walk"));
    let tsv = std::fs::read_to_string(out.join("gaitqc.tsv")).unwrap();
    assert!(tsv.starts_with("variable\tvalue"));
}

#[test]
fn cancelling_at_the_output_stage_leaves_no_files() {
    for run in 0..10 {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let mut ctx = Ctx::new(None, out.clone(), TestType::Tug, small_channel(), true, true);
        ctx.frames = tug_frames();
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = spawn_analysis(ctx, format!("late-{run}"), Box::new(CountingSink(calls.clone()))).unwrap();

        for event in handle.events().iter() {
            if let StreamEvent::Progress { message, .. } = &event {
                if message == "running stage7_output" {
                    handle.cancel();
                    break;
                }
            }
        }
        let outcome = handle.disconnect().unwrap();

        // The cancel can land after the last check; then the sink runs once.
        match outcome {
            JobOutcome::Cancelled => assert_eq!(calls.load(Ordering::SeqCst), 0),
            JobOutcome::Completed(_) => assert_eq!(calls.load(Ordering::SeqCst), 1),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(!out.join("gaitqc.json").exists());
        assert!(!out.join("gaitqc.tsv").exists());
    }
}

#[test]
fn empty_file_sink_is_empty() {
    let ctx = Ctx::from_frames(tug_frames(), TestType::Tug, Config::default());
    assert!(ReportFileSink::for_ctx(&ctx).is_empty());
    let sink = ReportFileSink::new().with_json("x.json".into()).with_tsv("x.tsv".into());
    assert!(!sink.is_empty());
}

#[test]
fn events_serialise_with_type_tag() {
    let event = StreamEvent::Progress {
        file_id: "a".to_string(),
        progress: 25,
        message: "running stage2_phases".to_string(),
    };
    let line = event.to_json_line().unwrap();
    assert!(line.starts_with("{\"type\":\"progress\""));
    assert!(!line.contains('\n'));
    assert_eq!(event.kind(), "progress");
    let back: StreamEvent = serde_json::from_str(&line).unwrap();
    assert_eq!(back, event);
}
