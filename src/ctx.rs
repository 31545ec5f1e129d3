use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::Config;
use crate::gait::WalkTiming;
use crate::gait::metrics::GaitAnalysis;
use crate::phases::PhaseSegmentation;
use crate::pose::LandmarkFrame;
use crate::pose::geometry::FrameFeatures;
use crate::schema::v1::{GaitQcV1, Sex, TestType, Variable};
use crate::scores::{ConfidenceScore, NormativeComparison};

#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub out_dir: PathBuf,
    pub json_path: PathBuf,
    pub tsv_path: PathBuf,
}

/// Patient attributes that refine the analysis when known.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientInfo {
    pub height_cm: Option<f64>,
    pub age: Option<u32>,
    pub sex: Option<Sex>,
    /// Clinician-entered BBS score.
    pub score: Option<u32>,
}

#[derive(Debug)]
pub struct Ctx {
    /// Landmark file; `None` when `frames` were supplied directly.
    pub input: Option<PathBuf>,
    pub test_type: TestType,
    pub config: Config,
    pub patient: PatientInfo,
    pub file_id: Option<String>,
    pub write_json: bool,
    pub write_tsv: bool,
    pub output: OutputPaths,
    pub frames: Vec<LandmarkFrame>,
    pub fps: Option<f64>,
    pub total_frames: usize,
    pub dropped_frames: usize,
    pub features: Vec<FrameFeatures>,
    pub detected_frames: usize,
    pub segmentation: Option<PhaseSegmentation>,
    pub timing: Option<WalkTiming>,
    pub gait: Option<GaitAnalysis>,
    pub confidence: Option<ConfidenceScore>,
    pub normative: Option<BTreeMap<Variable, NormativeComparison>>,
    pub warnings: Vec<String>,
    pub report: Option<GaitQcV1>,
}

impl Ctx {
    pub fn new(
        input: Option<PathBuf>,
        out_dir: PathBuf,
        test_type: TestType,
        config: Config,
        write_json: bool,
        write_tsv: bool,
    ) -> Self {
        let json_path = out_dir.join("gaitqc.json");
        let tsv_path = out_dir.join("gaitqc.tsv");
        Self {
            input,
            test_type,
            config,
            patient: PatientInfo::default(),
            file_id: None,
            write_json,
            write_tsv,
            output: OutputPaths {
                out_dir,
                json_path,
                tsv_path,
            },
            frames: Vec::new(),
            fps: None,
            total_frames: 0,
            dropped_frames: 0,
            features: Vec::new(),
            detected_frames: 0,
            segmentation: None,
            timing: None,
            gait: None,
            confidence: None,
            normative: None,
            warnings: Vec::new(),
            report: None,
        }
    }

    /// Context over frames already in memory, with no file output.
    pub fn from_frames(frames: Vec<LandmarkFrame>, test_type: TestType, config: Config) -> Self {
        let mut ctx = Self::new(None, PathBuf::from("."), test_type, config, false, false);
        ctx.frames = frames;
        ctx
    }

    pub fn stream_duration(&self) -> f64 {
        match (self.frames.first(), self.frames.last()) {
            (Some(a), Some(b)) => b.time - a.time,
            _ => 0.0,
        }
    }
}
