use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::gait::walk_timing;
use crate::pipeline::Stage;

pub struct Stage3Zone;

impl Stage3Zone {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage3Zone {
    fn name(&self) -> &'static str {
        "stage3_zone"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let timing = walk_timing(
            ctx.test_type,
            &ctx.frames,
            ctx.segmentation.as_ref(),
            &ctx.config.gait,
        );
        ctx.warnings.extend(timing.warnings.iter().cloned());
        info!(
            walk_time_seconds = timing.walk_time_seconds,
            walk_speed_mps = timing.walk_speed_mps,
            zone_s = timing.zone.duration(),
            "zone_ready"
        );
        ctx.timing = Some(timing);
        Ok(())
    }
}
