use anyhow::{Context, Result};
use tracing::info;

use crate::ctx::Ctx;
use crate::gait::metrics::extract;
use crate::pipeline::Stage;

pub struct Stage4Gait;

impl Stage4Gait {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage4Gait {
    fn name(&self) -> &'static str {
        "stage4_gait"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let timing = ctx.timing.as_ref().context("walk timing missing")?;
        let gait = extract(
            &ctx.frames,
            &timing.zone,
            &ctx.config.gait,
            ctx.patient.height_cm,
        );
        ctx.warnings.extend(gait.warnings.iter().cloned());
        info!(
            strikes = gait.strikes.len(),
            variables = gait.variables.len(),
            "gait_metrics_ready"
        );
        ctx.gait = Some(gait);
        Ok(())
    }
}
