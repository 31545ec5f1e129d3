use anyhow::{Context, Result};
use tracing::info;

use crate::ctx::Ctx;
use crate::pipeline::Stage;
use crate::pose::detection_rate;
use crate::scores::confidence::{ConfidenceSignals, compute_confidence};

pub struct Stage5Confidence;

impl Stage5Confidence {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage5Confidence {
    fn name(&self) -> &'static str {
        "stage5_confidence"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let timing = ctx.timing.as_ref().context("walk timing missing")?;
        let signals = ConfidenceSignals {
            test_type: ctx.test_type,
            detection_rate: detection_rate(&ctx.frames, ctx.config.gait.visibility_threshold),
            stream_duration: ctx.stream_duration(),
            walk_time_seconds: timing.walk_time_seconds,
            walk_speed_mps: timing.walk_speed_mps,
        };
        let score = compute_confidence(&signals, &ctx.config.confidence);
        info!(score = score.score, level = score.level.as_str(), "confidence_ready");
        ctx.confidence = Some(score);
        Ok(())
    }
}
