//! Publish step - moves the decoded frames out of the temp directory and
//! binds them to a new image-sequence anchor.

use std::path::PathBuf;

use crate::models::JobStage;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState};
use crate::publish::{publish, PublishRequest};
use crate::scene::TweenScene;

pub struct PublishStep;

impl PublishStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PublishStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for PublishStep {
    fn name(&self) -> &str {
        "Publish"
    }

    fn stage(&self) -> JobStage {
        JobStage::Publishing
    }

    fn description(&self) -> &str {
        "Publish frames as an image sequence"
    }

    fn validate_input(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match &state.decode {
            Some(decode) if !decode.frames.is_empty() => Ok(()),
            _ => Err(StepError::invalid_input("No decoded frames to publish")),
        }
    }

    fn execute(
        &self,
        ctx: &Context,
        state: &mut JobState,
        scene: &mut dyn TweenScene,
    ) -> StepResult<()> {
        let decode = state
            .decode
            .as_ref()
            .ok_or_else(|| StepError::invalid_input("No decoded frames to publish"))?;

        let request = PublishRequest::new(
            &ctx.job.id,
            PathBuf::from(&ctx.settings.paths.publish_root),
            decode.rate_hz,
        );
        let asset = publish(&decode.frames, &request, scene)?;

        ctx.logger.info(&format!(
            "Anchor '{}' plays {} frames from {}",
            asset.anchor,
            asset.frame_count,
            asset.directory.display()
        ));

        state.publish = Some(asset);
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match &state.publish {
            Some(asset) if asset.frame_count == asset.frames.len() => Ok(()),
            Some(_) => Err(StepError::invalid_output("Published frame count mismatch")),
            None => Err(StepError::invalid_output("Publish results not recorded")),
        }
    }
}
