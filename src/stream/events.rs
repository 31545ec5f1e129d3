use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::phases::{PhaseBoundary, PhaseSegmentation, TugPhase};
use crate::schema::v1::GaitQcV1;

/// Messages on the push channel, serialised with a `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Progress {
        file_id: String,
        /// 0..100
        progress: u8,
        message: String,
    },
    Completed {
        file_id: String,
        result: CompletedResult,
    },
    Error {
        file_id: String,
        message: String,
    },
    PhaseUpdate {
        current_phase: TugPhase,
        elapsed_time: f64,
        phase_elapsed: f64,
        frames: usize,
    },
    PhaseTransition {
        from_phase: TugPhase,
        to_phase: TugPhase,
        transition_time: f64,
        confidence: f64,
        transitions: Vec<PhaseBoundary>,
    },
    Heartbeat {
        frames: usize,
        idle_ms: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompletedResult {
    Test(Box<GaitQcV1>),
    Phases(PhaseSegmentation),
}

impl StreamEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Progress { .. } => "progress",
            StreamEvent::Completed { .. } => "completed",
            StreamEvent::Error { .. } => "error",
            StreamEvent::PhaseUpdate { .. } => "phase_update",
            StreamEvent::PhaseTransition { .. } => "phase_transition",
            StreamEvent::Heartbeat { .. } => "heartbeat",
        }
    }

    /// `completed` and `error` end a job's event stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Completed { .. } | StreamEvent::Error { .. })
    }

    /// Single-line JSON for JSON Lines output.
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
