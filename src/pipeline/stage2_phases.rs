use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::phases::segment::segment_features;
use crate::pipeline::Stage;
use crate::schema::v1::TestType;

pub struct Stage2Phases;

impl Stage2Phases {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage2Phases {
    fn name(&self) -> &'static str {
        "stage2_phases"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if ctx.test_type != TestType::Tug {
            return Ok(());
        }
        let seg = segment_features(&ctx.features, &ctx.config.phases);
        let fallback = seg.fallback_count();
        if fallback > 0 {
            ctx.warnings.push(format!(
                "{} of 4 phase transitions could not be detected; proportional fallback used",
                fallback
            ));
        }
        info!(
            total_time = seg.total_time,
            fallback,
            low_confidence = seg.low_confidence,
            "phases_ready"
        );
        ctx.segmentation = Some(seg);
        Ok(())
    }
}
