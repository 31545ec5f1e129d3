//! Landmark stream and patient history readers.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::history::PatientHistory;
use crate::io::open_maybe_gz;
use crate::pose::LandmarkFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkFormat {
    /// `{ "fps": .., "frames": [..] }`
    Json,
    /// One frame object per line.
    JsonLines,
}

impl LandmarkFormat {
    /// `.jsonl` / `.ndjson` (optionally gzipped) are JSON Lines; anything
    /// else is a single JSON document.
    pub fn detect(path: &Path) -> Self {
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let name = name.strip_suffix(".gz").unwrap_or(&name);
        if name.ends_with(".jsonl") || name.ends_with(".ndjson") {
            Self::JsonLines
        } else {
            Self::Json
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkStream {
    pub fps: Option<f64>,
    pub frames: Vec<LandmarkFrame>,
}

#[derive(Debug, Deserialize)]
struct LandmarkDocument {
    #[serde(default)]
    fps: Option<f64>,
    frames: Vec<LandmarkFrame>,
}

pub fn read_landmarks(path: &Path) -> Result<LandmarkStream> {
    let reader = open_maybe_gz(path)?;
    parse_landmarks(reader, LandmarkFormat::detect(path))
        .with_context(|| format!("failed to read landmarks from {}", path.display()))
}

pub fn parse_landmarks<R: Read>(reader: R, format: LandmarkFormat) -> Result<LandmarkStream> {
    match format {
        LandmarkFormat::Json => {
            let doc: LandmarkDocument =
                serde_json::from_reader(BufReader::new(reader)).context("invalid landmark JSON")?;
            Ok(LandmarkStream {
                fps: doc.fps,
                frames: doc.frames,
            })
        }
        LandmarkFormat::JsonLines => {
            let mut frames = Vec::new();
            for (i, line) in BufReader::new(reader).lines().enumerate() {
                let line = line.context("failed to read landmark line")?;
                if let Some(frame) = parse_frame_line(&line, i + 1)? {
                    frames.push(frame);
                }
            }
            Ok(LandmarkStream { fps: None, frames })
        }
    }
}

/// Parses one JSON Lines frame; blank lines yield `None`.
pub fn parse_frame_line(line: &str, line_no: usize) -> Result<Option<LandmarkFrame>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let frame = serde_json::from_str(trimmed)
        .with_context(|| format!("invalid landmark frame on line {}", line_no))?;
    Ok(Some(frame))
}

/// Loads a patient history and orders its tests by date.
pub fn read_history(path: &Path) -> Result<PatientHistory> {
    let reader = open_maybe_gz(path)?;
    let mut history: PatientHistory = serde_json::from_reader(BufReader::new(reader))
        .with_context(|| format!("invalid history file {}", path.display()))?;
    history.sort_by_date();
    Ok(history)
}
