//! Real-time TUG segmentation over a bounded frame channel.

use std::io::BufRead;
use std::sync::mpsc::{Receiver, RecvTimeoutError, SyncSender, sync_channel};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::config::Config;
use crate::input::parse_frame_line;
use crate::phases::PhaseSegmentation;
use crate::phases::tracker::PhaseTracker;
use crate::pose::LandmarkFrame;
use crate::pose::geometry::FrameFeatures;
use crate::stream::events::{CompletedResult, StreamEvent};

/// Incremental session state. Memory is bounded by the tracker's window.
pub struct LiveSession {
    tracker: PhaseTracker,
    visibility_threshold: f64,
    update_interval: f64,
    last_update: Option<f64>,
}

impl LiveSession {
    pub fn new(cfg: &Config) -> Self {
        Self {
            tracker: PhaseTracker::new(cfg.phases.clone()),
            visibility_threshold: cfg.gait.visibility_threshold,
            update_interval: cfg.live.update_interval_s,
            last_update: None,
        }
    }

    pub fn tracker(&self) -> &PhaseTracker {
        &self.tracker
    }

    /// Feeds one frame and returns the events it produced, transition first.
    pub fn push_frame(&mut self, frame: &LandmarkFrame) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        let seen = self.tracker.frames_seen();
        let features = FrameFeatures::from_frame(frame, self.visibility_threshold);
        if let Some(boundary) = self.tracker.push(features) {
            events.push(StreamEvent::PhaseTransition {
                from_phase: boundary.from_phase,
                to_phase: boundary.to_phase,
                transition_time: boundary.time,
                confidence: boundary.confidence,
                transitions: self.tracker.boundaries().to_vec(),
            });
        }
        if self.tracker.frames_seen() == seen {
            return events;
        }
        let due = match self.last_update {
            None => true,
            Some(t) => frame.time - t >= self.update_interval,
        };
        if due {
            self.last_update = Some(frame.time);
            events.push(StreamEvent::PhaseUpdate {
                current_phase: self.tracker.current_phase(),
                elapsed_time: self.tracker.elapsed(),
                phase_elapsed: self.tracker.phase_elapsed(),
                frames: self.tracker.frames_seen(),
            });
        }
        events
    }

    pub fn finish(&self) -> PhaseSegmentation {
        self.tracker.finish()
    }
}

/// Consumes frames until the sender hangs up, pushing events as they are
/// confirmed. A heartbeat goes out whenever no frame arrives within the
/// configured interval. Ends with a `completed` event carrying the
/// finalised segmentation.
pub fn run_live(
    frames: &Receiver<LandmarkFrame>,
    events: &SyncSender<StreamEvent>,
    cfg: &Config,
    file_id: &str,
) -> Result<PhaseSegmentation> {
    let mut session = LiveSession::new(cfg);
    let heartbeat = Duration::from_millis(cfg.live.heartbeat_interval_ms.max(1));
    let mut last_frame = Instant::now();
    loop {
        match frames.recv_timeout(heartbeat) {
            Ok(frame) => {
                last_frame = Instant::now();
                for event in session.push_frame(&frame) {
                    send(events, event)?;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                let idle_ms = last_frame.elapsed().as_millis() as u64;
                debug!(idle_ms, "heartbeat");
                send(
                    events,
                    StreamEvent::Heartbeat {
                        frames: session.tracker().frames_seen(),
                        idle_ms,
                    },
                )?;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    let segmentation = session.finish();
    info!(
        frames = session.tracker().frames_seen(),
        rejected = session.tracker().rejected(),
        low_confidence = segmentation.low_confidence,
        "live session finished"
    );
    send(
        events,
        StreamEvent::Completed {
            file_id: file_id.to_string(),
            result: CompletedResult::Phases(segmentation.clone()),
        },
    )?;
    Ok(segmentation)
}

fn send(events: &SyncSender<StreamEvent>, event: StreamEvent) -> Result<()> {
    if events.send(event).is_err() {
        bail!("event receiver disconnected");
    }
    Ok(())
}

/// Parses JSON Lines frames on a reader thread into a bounded channel.
/// The thread returns the number of frames forwarded.
pub fn spawn_frame_reader<R>(reader: R, capacity: usize) -> Result<(Receiver<LandmarkFrame>, JoinHandle<Result<usize>>)>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = sync_channel(capacity.max(1));
    let handle = thread::Builder::new()
        .name("gaitqc-frames".to_string())
        .spawn(move || {
            let mut sent = 0usize;
            for (i, line) in reader.lines().enumerate() {
                let line = line.context("failed to read frame line")?;
                let Some(frame) = parse_frame_line(&line, i + 1)? else {
                    continue;
                };
                if tx.send(frame).is_err() {
                    break;
                }
                sent += 1;
            }
            Ok(sent)
        })
        .context("failed to spawn frame reader")?;
    Ok((rx, handle))
}
