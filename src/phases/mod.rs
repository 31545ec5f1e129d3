//! Timed Up and Go phase segmentation.
//!
//! The five phases form a closed, ordered state machine with no backward
//! transitions. Each edge has one pure detector in [`detectors`]; the
//! [`tracker::PhaseTracker`] runs them incrementally over a bounded window
//! and [`segment::segment`] reuses the tracker for whole recordings.

pub mod detectors;
pub mod segment;
pub mod tracker;
pub mod window;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TugPhase {
    StandUp,
    WalkOut,
    Turn,
    WalkBack,
    SitDown,
}

impl TugPhase {
    pub const ORDER: [TugPhase; 5] = [
        TugPhase::StandUp,
        TugPhase::WalkOut,
        TugPhase::Turn,
        TugPhase::WalkBack,
        TugPhase::SitDown,
    ];

    pub fn index(self) -> usize {
        match self {
            TugPhase::StandUp => 0,
            TugPhase::WalkOut => 1,
            TugPhase::Turn => 2,
            TugPhase::WalkBack => 3,
            TugPhase::SitDown => 4,
        }
    }

    pub fn next(self) -> Option<TugPhase> {
        match self {
            TugPhase::StandUp => Some(TugPhase::WalkOut),
            TugPhase::WalkOut => Some(TugPhase::Turn),
            TugPhase::Turn => Some(TugPhase::WalkBack),
            TugPhase::WalkBack => Some(TugPhase::SitDown),
            TugPhase::SitDown => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TugPhase::StandUp => "stand_up",
            TugPhase::WalkOut => "walk_out",
            TugPhase::Turn => "turn",
            TugPhase::WalkBack => "walk_back",
            TugPhase::SitDown => "sit_down",
        }
    }
}

/// A transition between two consecutive phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseBoundary {
    pub from_phase: TugPhase,
    pub to_phase: TugPhase,
    pub frame_index: usize,
    pub time: f64,
    /// 0..1; zero for fallback boundaries.
    pub confidence: f64,
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSegment {
    pub phase: TugPhase,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub start_frame: usize,
    pub end_frame: usize,
}

/// Five contiguous phases spanning the whole stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSegmentation {
    pub phases: Vec<PhaseSegment>,
    pub boundaries: Vec<PhaseBoundary>,
    pub total_time: f64,
    pub low_confidence: bool,
}

impl PhaseSegmentation {
    pub fn phase(&self, phase: TugPhase) -> Option<&PhaseSegment> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    pub fn fallback_count(&self) -> usize {
        self.boundaries.iter().filter(|b| b.fallback).count()
    }
}
