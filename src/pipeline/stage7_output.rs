use anyhow::{Context, Result};
use tracing::info;

use crate::ctx::Ctx;
use crate::io::{json_writer, tsv_writer};
use crate::pipeline::Stage;

pub struct Stage7Output;

impl Stage7Output {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage7Output {
    fn name(&self) -> &'static str {
        "stage7_output"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let report = json_writer::build_report(ctx)?;
        ctx.report = Some(report);
        let report = ctx.report.as_ref().context("report missing")?;

        if ctx.write_json {
            json_writer::write_json(&ctx.output.json_path, report)?;
        }
        if ctx.write_tsv {
            tsv_writer::write_tsv(&ctx.output.tsv_path, report)?;
        }

        info!("stage7_output_ready");
        Ok(())
    }
}
