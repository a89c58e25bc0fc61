//! Export step - renders the two source frames to stills.
//!
//! The stills land in the job temp directory as `frame1.png` and
//! `frame2.png`. The scene camera and current frame are restored afterwards.

use crate::export::export_pair;
use crate::models::JobStage;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, ExportOutput, JobState};
use crate::scene::TweenScene;

pub struct ExportStep;

impl ExportStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ExportStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ExportStep {
    fn name(&self) -> &str {
        "Export"
    }

    fn stage(&self) -> JobStage {
        JobStage::Exporting
    }

    fn description(&self) -> &str {
        "Render both source frames to stills"
    }

    fn validate_input(&self, ctx: &Context, _state: &JobState) -> StepResult<()> {
        if !ctx.work_dir.is_dir() {
            return Err(StepError::invalid_input(format!(
                "Work directory does not exist: {}",
                ctx.work_dir.display()
            )));
        }
        Ok(())
    }

    fn execute(
        &self,
        ctx: &Context,
        state: &mut JobState,
        scene: &mut dyn TweenScene,
    ) -> StepResult<()> {
        let frames = ctx.job.frames;
        ctx.logger.info(&format!(
            "Rendering frames {} and {}",
            frames.first, frames.second
        ));
        if !frames.is_adjacent() {
            ctx.logger.warn(&format!(
                "Frames {} and {} are not adjacent",
                frames.first, frames.second
            ));
        }

        let pair = export_pair(
            scene,
            frames,
            ctx.job.target.as_deref(),
            &ctx.work_dir,
            &ctx.camera,
        )?;

        ctx.logger.info(&format!(
            "Exported {}x{} stills to {}",
            pair.width,
            pair.height,
            ctx.work_dir.display()
        ));

        state.export = Some(ExportOutput {
            first: pair.first,
            second: pair.second,
            width: pair.width,
            height: pair.height,
        });
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let export = state
            .export
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Export results not recorded"))?;
        for still in [&export.first, &export.second] {
            if !still.is_file() {
                return Err(StepError::invalid_output(format!(
                    "Still missing: {}",
                    still.display()
                )));
            }
        }
        Ok(())
    }
}
