//! Decode step - samples the backend artifact into numbered PNG frames.

use crate::decode::FrameDecoder;
use crate::models::JobStage;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, DecodeOutput, JobState};
use crate::scene::TweenScene;

pub struct DecodeStep;

impl DecodeStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DecodeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for DecodeStep {
    fn name(&self) -> &str {
        "Decode"
    }

    fn stage(&self) -> JobStage {
        JobStage::DecodingOutput
    }

    fn description(&self) -> &str {
        "Decode the backend artifact to frames"
    }

    fn validate_input(&self, ctx: &Context, state: &JobState) -> StepResult<()> {
        if state.invoke.is_none() {
            return Err(StepError::invalid_input("No backend artifact"));
        }
        if ctx.sampling_rate_hz() == 0 {
            return Err(StepError::invalid_input("Sampling rate must be positive"));
        }
        Ok(())
    }

    fn execute(
        &self,
        ctx: &Context,
        state: &mut JobState,
        _scene: &mut dyn TweenScene,
    ) -> StepResult<()> {
        let artifact = state
            .invoke
            .as_ref()
            .map(|i| i.artifact.clone())
            .ok_or_else(|| StepError::invalid_input("No backend artifact"))?;
        let rate_hz = ctx.sampling_rate_hz();

        let decoder = FrameDecoder::new(&ctx.settings.tween.ffmpeg);
        let frames = decoder.decode(
            &artifact,
            rate_hz,
            &ctx.frames_dir,
            Some(ctx.logger.as_ref()),
        )?;
        ctx.logger
            .info(&format!("Decoded {} frames at {} Hz", frames.len(), rate_hz));

        state.decode = Some(DecodeOutput { frames, rate_hz });
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match &state.decode {
            Some(decode) if !decode.frames.is_empty() => Ok(()),
            Some(_) => Err(StepError::invalid_output("No frames decoded")),
            None => Err(StepError::invalid_output("Decode results not recorded")),
        }
    }
}
