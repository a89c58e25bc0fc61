//! Pipeline step trait definition.

use super::errors::StepResult;
use super::types::{Context, JobState};
use crate::models::JobStage;
use crate::scene::TweenScene;

/// One stage of the tween pipeline.
///
/// The pipeline runner calls these methods in order:
///
/// 1. `validate_input` - Check preconditions before execution
/// 2. `execute` - Perform the stage's work
/// 3. `validate_output` - Verify the stage recorded valid output
///
/// Steps hold no per-job data; everything they produce goes into
/// [`JobState`].
pub trait PipelineStep: Send + Sync {
    /// Step name (for logging and error context).
    fn name(&self) -> &str;

    /// Job stage this step runs in.
    fn stage(&self) -> JobStage;

    fn validate_input(&self, ctx: &Context, state: &JobState) -> StepResult<()>;

    /// Perform the stage and record results in `state`.
    ///
    /// Only the export and publish stages touch `scene`.
    fn execute(
        &self,
        ctx: &Context,
        state: &mut JobState,
        scene: &mut dyn TweenScene,
    ) -> StepResult<()>;

    fn validate_output(&self, ctx: &Context, state: &JobState) -> StepResult<()>;

    /// Human-readable description of what this step does.
    fn description(&self) -> &str {
        self.name()
    }
}
