use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::ctx::Ctx;
use crate::pipeline::Stage;
use crate::scores::normative::compare_test;

pub struct Stage6Normative;

impl Stage6Normative {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage6Normative {
    fn name(&self) -> &'static str {
        "stage6_normative"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let (Some(age), Some(sex)) = (ctx.patient.age, ctx.patient.sex) else {
            debug!("age or sex unknown; normative comparison skipped");
            return Ok(());
        };
        let timing = ctx.timing.as_ref().context("walk timing missing")?;
        let gait = ctx.gait.as_ref().context("gait metrics missing")?;
        let compared = compare_test(
            ctx.test_type,
            timing.walk_time_seconds,
            timing.walk_speed_mps,
            &gait.variables,
            age,
            sex,
        );
        info!(compared = compared.len(), age, "normative_ready");
        ctx.normative = Some(compared.into_iter().collect());
        Ok(())
    }
}
