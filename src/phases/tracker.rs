use tracing::{debug, info, warn};

use crate::config::PhaseConfig;
use crate::phases::detectors;
use crate::phases::window::FeatureWindow;
use crate::phases::{PhaseBoundary, PhaseSegment, PhaseSegmentation, TugPhase};
use crate::pose::geometry::FrameFeatures;

/// Incremental TUG phase state machine.
///
/// Holds only a fixed-size feature window plus running counters. A
/// transition is emitted as soon as its detector confirms it and is never
/// revised afterwards.
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    config: PhaseConfig,
    window: FeatureWindow,
    current: TugPhase,
    boundaries: Vec<PhaseBoundary>,
    frames_seen: usize,
    rejected: usize,
    first_time: Option<f64>,
    last_time: Option<f64>,
    phase_start: f64,
}

impl PhaseTracker {
    pub fn new(config: PhaseConfig) -> Self {
        let window = FeatureWindow::new(config.window_frames);
        Self {
            config,
            window,
            current: TugPhase::StandUp,
            boundaries: Vec::with_capacity(4),
            frames_seen: 0,
            rejected: 0,
            first_time: None,
            last_time: None,
            phase_start: 0.0,
        }
    }

    /// Feeds one frame. Frames whose timestamp does not advance are ignored.
    pub fn push(&mut self, features: FrameFeatures) -> Option<PhaseBoundary> {
        if !features.time.is_finite() {
            self.rejected += 1;
            return None;
        }
        if let Some(last) = self.last_time {
            if features.time <= last {
                self.rejected += 1;
                warn!(time = features.time, last, "out-of-order frame ignored");
                return None;
            }
        }
        if self.first_time.is_none() {
            self.first_time = Some(features.time);
            self.phase_start = features.time;
        }
        self.last_time = Some(features.time);
        let index = self.frames_seen;
        self.frames_seen += 1;

        if self.current.is_terminal() {
            return None;
        }
        self.window.push(features);
        if !self.window.is_full() {
            return None;
        }

        let len = self.window.len();
        let slice = self.window.as_slice();
        let detection = detectors::detect(self.current, slice, &self.config)?;
        let onset_time = slice[detection.onset].time;
        let next = self.current.next()?;
        let boundary = PhaseBoundary {
            from_phase: self.current,
            to_phase: next,
            frame_index: index + 1 - len + detection.onset,
            time: onset_time,
            confidence: detection.confidence,
            fallback: false,
        };
        info!(
            from = self.current.as_str(),
            to = next.as_str(),
            time = onset_time,
            confidence = detection.confidence,
            "phase transition"
        );
        self.current = next;
        self.phase_start = onset_time;
        self.boundaries.push(boundary.clone());
        self.window.clear();
        Some(boundary)
    }

    pub fn current_phase(&self) -> TugPhase {
        self.current
    }

    pub fn boundaries(&self) -> &[PhaseBoundary] {
        &self.boundaries
    }

    pub fn frames_seen(&self) -> usize {
        self.frames_seen
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Seconds since the first accepted frame.
    pub fn elapsed(&self) -> f64 {
        match (self.first_time, self.last_time) {
            (Some(a), Some(b)) => b - a,
            _ => 0.0,
        }
    }

    /// Seconds spent in the current phase.
    pub fn phase_elapsed(&self) -> f64 {
        self.last_time.map(|t| t - self.phase_start).unwrap_or(0.0)
    }

    /// Builds the five-phase segmentation, filling undetected transitions
    /// by proportional slicing of the remaining time.
    pub fn finish(&self) -> PhaseSegmentation {
        let start = self.first_time.unwrap_or(0.0);
        let end = self.last_time.unwrap_or(start);
        let last_frame = self.frames_seen.saturating_sub(1);

        let mut boundaries = self.boundaries.clone();
        let detected = boundaries.len();
        if detected < 4 {
            let (anchor_time, anchor_frame) = boundaries
                .last()
                .map(|b| (b.time, b.frame_index))
                .unwrap_or((start, 0));
            let remaining = &self.config.fallback_weights[detected..];
            let total_weight: f64 = remaining.iter().sum();
            let span = (end - anchor_time).max(0.0);
            let mut acc = 0.0;
            let mut prev_frame = anchor_frame;
            for k in detected..4 {
                acc += self.config.fallback_weights[k];
                let time = anchor_time + span * acc / total_weight;
                let frame_index = self.estimate_frame(time, start, end).max(prev_frame);
                prev_frame = frame_index;
                boundaries.push(PhaseBoundary {
                    from_phase: TugPhase::ORDER[k],
                    to_phase: TugPhase::ORDER[k + 1],
                    frame_index,
                    time,
                    confidence: 0.0,
                    fallback: true,
                });
            }
            warn!(
                detected,
                fallback = 4 - detected,
                "phase transitions unresolved; proportional fallback applied"
            );
        } else {
            debug!("all phase transitions detected");
        }

        let mut phases = Vec::with_capacity(5);
        for (i, phase) in TugPhase::ORDER.iter().enumerate() {
            let (start_time, start_frame) = if i == 0 {
                (start, 0)
            } else {
                (boundaries[i - 1].time, boundaries[i - 1].frame_index)
            };
            let (end_time, end_frame) = if i == 4 {
                (end, last_frame)
            } else {
                (boundaries[i].time, boundaries[i].frame_index)
            };
            phases.push(PhaseSegment {
                phase: *phase,
                start_time,
                end_time,
                duration: (end_time - start_time).max(0.0),
                start_frame,
                end_frame,
            });
        }

        PhaseSegmentation {
            phases,
            low_confidence: boundaries.iter().any(|b| b.fallback),
            boundaries,
            total_time: end - start,
        }
    }

    fn estimate_frame(&self, time: f64, start: f64, end: f64) -> usize {
        if self.frames_seen < 2 || end <= start {
            return 0;
        }
        let pos = (time - start) / (end - start) * (self.frames_seen - 1) as f64;
        (pos.round().max(0.0) as usize).min(self.frames_seen - 1)
    }
}
