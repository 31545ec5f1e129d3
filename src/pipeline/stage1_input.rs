use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::ctx::Ctx;
use crate::input::read_landmarks;
use crate::pipeline::Stage;
use crate::pose::drop_out_of_order;
use crate::pose::geometry::FrameFeatures;

pub struct Stage1Input;

impl Stage1Input {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage1Input {
    fn name(&self) -> &'static str {
        "stage1_input"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if ctx.frames.is_empty() {
            if let Some(path) = &ctx.input {
                let stream = read_landmarks(path)?;
                ctx.fps = stream.fps;
                ctx.frames = stream.frames;
            }
        }
        ctx.total_frames = ctx.frames.len();
        if ctx.frames.is_empty() {
            bail!("pose estimation produced no frames");
        }

        let dropped = drop_out_of_order(&mut ctx.frames);
        if dropped > 0 {
            warn!(dropped, "out-of-order frames dropped");
            ctx.warnings
                .push(format!("{} frames with non-increasing timestamps dropped", dropped));
        }
        ctx.dropped_frames = dropped;

        let thr = ctx.config.gait.visibility_threshold;
        ctx.features = ctx
            .frames
            .iter()
            .map(|f| FrameFeatures::from_frame(f, thr))
            .collect();
        ctx.detected_frames = ctx.features.iter().filter(|f| f.detected).count();
        if ctx.detected_frames == 0 {
            bail!(
                "no usable frames: body joints were not detected in any of {} frames",
                ctx.total_frames
            );
        }
        info!(
            frames = ctx.frames.len(),
            detected = ctx.detected_frames,
            dropped,
            "landmarks_ready"
        );
        Ok(())
    }
}
