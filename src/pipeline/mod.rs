use anyhow::Result;
use std::time::Instant;
use tracing::{info, warn};

use crate::ctx::Ctx;

pub mod stage0_scaffold;
pub mod stage1_input;
pub mod stage2_phases;
pub mod stage3_zone;
pub mod stage4_gait;
pub mod stage5_confidence;
pub mod stage6_normative;
pub mod stage7_output;

use stage0_scaffold::Stage0Scaffold;
use stage1_input::Stage1Input;
use stage2_phases::Stage2Phases;
use stage3_zone::Stage3Zone;
use stage4_gait::Stage4Gait;
use stage5_confidence::Stage5Confidence;
use stage6_normative::Stage6Normative;
use stage7_output::Stage7Output;

pub trait Stage {
    fn name(&self) -> &'static str;
    fn run(&self, ctx: &mut Ctx) -> Result<()>;
}

/// Position of the stage about to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageProgress {
    pub index: usize,
    pub total: usize,
    pub name: &'static str,
}

impl StageProgress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        (self.index * 100 / self.total).min(100) as u8
    }
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Full single-test analysis, scaffold through output.
    pub fn analysis() -> Self {
        Self::new(vec![
            Box::new(Stage0Scaffold::new()),
            Box::new(Stage1Input::new()),
            Box::new(Stage2Phases::new()),
            Box::new(Stage3Zone::new()),
            Box::new(Stage4Gait::new()),
            Box::new(Stage5Confidence::new()),
            Box::new(Stage6Normative::new()),
            Box::new(Stage7Output::new()),
        ])
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn run(&self, ctx: &mut Ctx) -> Result<()> {
        self.run_with_progress(ctx, &mut |_| Ok(()))
    }

    /// Runs every stage, calling `observer` before each one. An observer
    /// error stops the pipeline before the stage runs.
    pub fn run_with_progress(
        &self,
        ctx: &mut Ctx,
        observer: &mut dyn FnMut(StageProgress) -> Result<()>,
    ) -> Result<()> {
        let total = self.stages.len();
        for (index, stage) in self.stages.iter().enumerate() {
            observer(StageProgress {
                index,
                total,
                name: stage.name(),
            })?;
            let start = Instant::now();
            info!(stage = stage.name(), "stage started");
            if let Err(err) = stage.run(ctx) {
                let elapsed_ms = start.elapsed().as_millis();
                warn!(
                    stage = stage.name(),
                    elapsed_ms = elapsed_ms as u64,
                    "stage failed"
                );
                return Err(err);
            }
            let elapsed_ms = start.elapsed().as_millis();
            info!(
                stage = stage.name(),
                elapsed_ms = elapsed_ms as u64,
                "stage finished"
            );
        }
        Ok(())
    }
}
