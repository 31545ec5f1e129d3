//! Batch analysis on a worker thread.
//!
//! Progress is pushed over a bounded channel. Dropping the receiver or
//! setting the cancel flag cancels the job at the next stage boundary, and
//! a cancelled job never reaches its sink. The pipeline itself writes no
//! files in job mode.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result, anyhow, bail};
use tracing::{info, warn};

use crate::ctx::Ctx;
use crate::io::{json_writer, tsv_writer};
use crate::pipeline::{Pipeline, StageProgress};
use crate::schema::v1::GaitQcV1;
use crate::stream::events::{CompletedResult, StreamEvent};

/// Persistence collaborator; called exactly once per successful job.
pub trait TestSink: Send {
    fn persist(&mut self, report: &GaitQcV1) -> Result<()>;
}

/// Writes the JSON report and the TSV table, whichever are configured.
/// Both files are written together, after the job has passed its last
/// cancellation check.
#[derive(Debug, Clone, Default)]
pub struct ReportFileSink {
    json_path: Option<PathBuf>,
    tsv_path: Option<PathBuf>,
}

impl ReportFileSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink matching the output flags of `ctx`.
    pub fn for_ctx(ctx: &Ctx) -> Self {
        Self {
            json_path: ctx.write_json.then(|| ctx.output.json_path.clone()),
            tsv_path: ctx.write_tsv.then(|| ctx.output.tsv_path.clone()),
        }
    }

    pub fn with_json(mut self, path: PathBuf) -> Self {
        self.json_path = Some(path);
        self
    }

    pub fn with_tsv(mut self, path: PathBuf) -> Self {
        self.tsv_path = Some(path);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.json_path.is_none() && self.tsv_path.is_none()
    }
}

impl TestSink for ReportFileSink {
    fn persist(&mut self, report: &GaitQcV1) -> Result<()> {
        for path in self.json_path.iter().chain(self.tsv_path.iter()) {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
            }
        }
        if let Some(path) = &self.json_path {
            json_writer::write_json(path, report)?;
        }
        if let Some(path) = &self.tsv_path {
            tsv_writer::write_tsv(path, report)?;
        }
        Ok(())
    }
}

/// Discards reports.
pub struct NullSink;

impl TestSink for NullSink {
    fn persist(&mut self, _report: &GaitQcV1) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed(Box<GaitQcV1>),
    Cancelled,
    Failed(String),
}

pub struct JobHandle {
    events: Receiver<StreamEvent>,
    cancel: Arc<AtomicBool>,
    worker: JoinHandle<JobOutcome>,
}

impl JobHandle {
    pub fn events(&self) -> &Receiver<StreamEvent> {
        &self.events
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Drains every event until the worker hangs up, then joins it.
    pub fn wait(self) -> Result<(Vec<StreamEvent>, JobOutcome)> {
        let events: Vec<StreamEvent> = self.events.iter().collect();
        let outcome = self
            .worker
            .join()
            .map_err(|_| anyhow!("analysis worker panicked"))?;
        Ok((events, outcome))
    }

    /// Hangs up without reading further events, which cancels a running
    /// job, and joins the worker.
    pub fn disconnect(self) -> Result<JobOutcome> {
        drop(self.events);
        self.worker
            .join()
            .map_err(|_| anyhow!("analysis worker panicked"))
    }
}

/// Starts the analysis of `ctx` on a new thread.
pub fn spawn_analysis(ctx: Ctx, file_id: String, sink: Box<dyn TestSink>) -> Result<JobHandle> {
    let capacity = ctx.config.live.channel_capacity.max(1);
    let (tx, events) = sync_channel(capacity);
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    let worker = thread::Builder::new()
        .name("gaitqc-job".to_string())
        .spawn(move || run_job(ctx, &file_id, sink, &tx, &flag))
        .context("failed to spawn analysis worker")?;
    Ok(JobHandle {
        events,
        cancel,
        worker,
    })
}

fn run_job(
    mut ctx: Ctx,
    file_id: &str,
    mut sink: Box<dyn TestSink>,
    tx: &SyncSender<StreamEvent>,
    cancel: &AtomicBool,
) -> JobOutcome {
    ctx.file_id = Some(file_id.to_string());
    // Files are only written by the sink.
    ctx.write_json = false;
    ctx.write_tsv = false;
    let pipeline = Pipeline::analysis();
    let mut observer = |p: StageProgress| -> Result<()> {
        if cancel.load(Ordering::SeqCst) {
            bail!("job cancelled");
        }
        let event = StreamEvent::Progress {
            file_id: file_id.to_string(),
            progress: p.percent(),
            message: format!("running {}", p.name),
        };
        if tx.send(event).is_err() {
            cancel.store(true, Ordering::SeqCst);
            bail!("event receiver disconnected");
        }
        Ok(())
    };
    let result = pipeline.run_with_progress(&mut ctx, &mut observer);

    if cancel.load(Ordering::SeqCst) {
        info!(file_id, "job cancelled");
        return JobOutcome::Cancelled;
    }
    if let Err(err) = result {
        return fail(tx, file_id, format!("{:#}", err));
    }
    let Some(report) = ctx.report.take() else {
        return fail(tx, file_id, "analysis produced no report".to_string());
    };

    let done = StreamEvent::Progress {
        file_id: file_id.to_string(),
        progress: 100,
        message: "analysis complete".to_string(),
    };
    if tx.send(done).is_err() || cancel.load(Ordering::SeqCst) {
        info!(file_id, "job cancelled before persistence");
        return JobOutcome::Cancelled;
    }
    if let Err(err) = sink.persist(&report) {
        return fail(tx, file_id, format!("failed to persist result: {:#}", err));
    }
    let _ = tx.send(StreamEvent::Completed {
        file_id: file_id.to_string(),
        result: CompletedResult::Test(Box::new(report.clone())),
    });
    info!(file_id, "job completed");
    JobOutcome::Completed(Box::new(report))
}

fn fail(tx: &SyncSender<StreamEvent>, file_id: &str, message: String) -> JobOutcome {
    warn!(file_id, error = %message, "job failed");
    let _ = tx.send(StreamEvent::Error {
        file_id: file_id.to_string(),
        message: message.clone(),
    });
    JobOutcome::Failed(message)
}
