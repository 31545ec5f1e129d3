use std::path::Path;

use anyhow::{Context, Result};

use crate::ctx::Ctx;
use crate::schema::v1::{FrameMeta, GaitQcV1, SCHEMA_VERSION, TOOL_NAME, TestType};

pub fn build_report(ctx: &Ctx) -> Result<GaitQcV1> {
    let timing = ctx.timing.as_ref().context("walk timing missing")?;
    let gait = ctx.gait.as_ref().context("gait metrics missing")?;
    let confidence = ctx.confidence.clone().context("confidence score missing")?;

    let frames = FrameMeta {
        total: ctx.total_frames as u64,
        detected: ctx.detected_frames as u64,
        dropped: ctx.dropped_frames as u64,
        duration_s: finite_or(ctx.stream_duration(), 0.0),
        fps: ctx.fps,
    };

    let score = match ctx.test_type {
        TestType::BergBalance => ctx.patient.score,
        _ => None,
    };

    Ok(GaitQcV1 {
        tool: TOOL_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        file_id: ctx.file_id.clone(),
        test_type: ctx.test_type,
        walk_time_seconds: finite_or(timing.walk_time_seconds, 0.0),
        walk_speed_mps: finite_or(timing.walk_speed_mps, 0.0),
        score,
        frames,
        phases: ctx.segmentation.clone(),
        zone: Some(timing.zone.clone()),
        clinical_variables: gait
            .variables
            .iter()
            .filter(|(_, v)| v.value.is_finite())
            .map(|(k, v)| (*k, v.clone()))
            .collect(),
        confidence,
        normative: ctx.normative.clone(),
        warnings: ctx.warnings.clone(),
    })
}

fn finite_or(value: f64, neutral: f64) -> f64 {
    if value.is_finite() { value } else { neutral }
}

pub fn write_json(path: &Path, report: &GaitQcV1) -> Result<()> {
    crate::io::write_json(path, report)
}
