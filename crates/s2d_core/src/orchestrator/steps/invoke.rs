//! Invoke step - runs the selected interpolation backend.

use crate::interpolate::{InterpolatorAdapter, InvokeRequest};
use crate::models::JobStage;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, InvokeOutput, JobState};
use crate::scene::TweenScene;

/// Hands the exported stills to FILM or ToonCrafter and waits for the
/// artifact. Blocks for as long as the backend runs.
pub struct InvokeStep;

impl InvokeStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InvokeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for InvokeStep {
    fn name(&self) -> &str {
        "Invoke"
    }

    fn stage(&self) -> JobStage {
        JobStage::InvokingBackend
    }

    fn description(&self) -> &str {
        "Run the interpolation backend"
    }

    fn validate_input(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if state.export.is_none() {
            return Err(StepError::invalid_input("No exported stills"));
        }
        Ok(())
    }

    fn execute(
        &self,
        ctx: &Context,
        state: &mut JobState,
        _scene: &mut dyn TweenScene,
    ) -> StepResult<()> {
        let export = state
            .export
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("No exported stills"))?;

        let adapter = InterpolatorAdapter::from_config(&ctx.job.backend)?;
        let request = InvokeRequest {
            first: export.first.clone(),
            second: export.second.clone(),
            work_dir: ctx.work_dir.clone(),
            output_dir: ctx.output_dir.clone(),
        };
        let command = adapter.command(&request).to_string();

        ctx.logger.info(&format!(
            "Interpolating with {} ({} in-betweens)",
            adapter.kind(),
            ctx.job.backend.in_betweens()
        ));
        let artifact = adapter.invoke(&request, Some(ctx.logger.as_ref()))?;
        ctx.logger
            .info(&format!("Backend artifact: {}", artifact.display()));

        state.invoke = Some(InvokeOutput {
            backend: adapter.kind(),
            artifact,
            command,
        });
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match &state.invoke {
            Some(invoke) if invoke.artifact.is_file() => Ok(()),
            Some(invoke) => Err(StepError::invalid_output(format!(
                "Artifact missing: {}",
                invoke.artifact.display()
            ))),
            None => Err(StepError::invalid_output("Backend results not recorded")),
        }
    }
}
