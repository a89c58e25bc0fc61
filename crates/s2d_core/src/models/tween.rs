//! Tween job description and its stage machine.

use serde::{Deserialize, Serialize};

use super::backend::BackendConfig;

/// The two source frames a tween job interpolates between.
///
/// Ordered. Adjacent by convention (`second == first + 1`) but not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramePair {
    pub first: i32,
    pub second: i32,
}

impl FramePair {
    pub fn new(first: i32, second: i32) -> Self {
        Self { first, second }
    }

    /// The current frame and the one after it.
    pub fn from_current(frame: i32) -> Self {
        Self::new(frame, frame + 1)
    }

    pub fn is_adjacent(&self) -> bool {
        self.second == self.first + 1
    }
}

/// One run of the AI tween pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweenJob {
    /// Unique job identifier (names the job's log and published directory).
    pub id: String,
    pub frames: FramePair,
    pub backend: BackendConfig,
    /// Object whose frames are rendered. `None` means the active object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl TweenJob {
    /// Create a job with a fresh identifier.
    pub fn new(frames: FramePair, backend: BackendConfig) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            frames,
            backend,
            target: None,
        }
    }

    /// Render a named object instead of the active one.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Short display name used for log files and error context.
    pub fn name(&self) -> String {
        let short: String = self.id.chars().take(8).collect();
        format!(
            "tween_{}-{}_{}",
            self.frames.first, self.frames.second, short
        )
    }
}

/// Why a job ended in [`JobStage::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    /// Stage that was running when the failure happened.
    pub stage: String,
    pub cause: String,
}

/// Lifecycle of a tween job.
///
/// Linear: each stage may only move to the next one, or to `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobStage {
    Created,
    Exporting,
    InvokingBackend,
    DecodingOutput,
    Publishing,
    Succeeded,
    Failed(FailureReason),
}

impl JobStage {
    /// The stage that follows this one on the success path.
    pub fn next(&self) -> Option<JobStage> {
        match self {
            JobStage::Created => Some(JobStage::Exporting),
            JobStage::Exporting => Some(JobStage::InvokingBackend),
            JobStage::InvokingBackend => Some(JobStage::DecodingOutput),
            JobStage::DecodingOutput => Some(JobStage::Publishing),
            JobStage::Publishing => Some(JobStage::Succeeded),
            JobStage::Succeeded | JobStage::Failed(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::Succeeded | JobStage::Failed(_))
    }

    /// Whether moving from `self` to `to` is allowed.
    pub fn can_enter(&self, to: &JobStage) -> bool {
        if self.is_terminal() {
            return false;
        }
        match to {
            JobStage::Failed(_) => true,
            other => self.next().as_ref() == Some(other),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            JobStage::Created => "Created",
            JobStage::Exporting => "Exporting",
            JobStage::InvokingBackend => "InvokingBackend",
            JobStage::DecodingOutput => "DecodingOutput",
            JobStage::Publishing => "Publishing",
            JobStage::Succeeded => "Succeeded",
            JobStage::Failed(_) => "Failed",
        }
    }
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStage::Failed(reason) => write!(f, "Failed at {}: {}", reason.stage, reason.cause),
            other => write!(f, "{}", other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed() -> JobStage {
        JobStage::Failed(FailureReason {
            stage: "Exporting".to_string(),
            cause: "boom".to_string(),
        })
    }

    #[test]
    fn success_path_is_linear() {
        let mut stage = JobStage::Created;
        let mut visited = vec![stage.name()];
        while let Some(next) = stage.next() {
            assert!(stage.can_enter(&next));
            stage = next;
            visited.push(stage.name());
        }
        assert_eq!(
            visited,
            vec![
                "Created",
                "Exporting",
                "InvokingBackend",
                "DecodingOutput",
                "Publishing",
                "Succeeded"
            ]
        );
    }

    #[test]
    fn no_skipping_or_back_edges() {
        assert!(!JobStage::Created.can_enter(&JobStage::InvokingBackend));
        assert!(!JobStage::DecodingOutput.can_enter(&JobStage::Exporting));
        assert!(!JobStage::Publishing.can_enter(&JobStage::Publishing));
    }

    #[test]
    fn failed_reachable_from_every_non_terminal_stage() {
        for stage in [
            JobStage::Created,
            JobStage::Exporting,
            JobStage::InvokingBackend,
            JobStage::DecodingOutput,
            JobStage::Publishing,
        ] {
            assert!(stage.can_enter(&failed()), "{stage} should reach Failed");
        }
        assert!(!JobStage::Succeeded.can_enter(&failed()));
        assert!(!failed().can_enter(&failed()));
    }

    #[test]
    fn frame_pair_from_current() {
        let pair = FramePair::from_current(10);
        assert_eq!(pair, FramePair::new(10, 11));
        assert!(pair.is_adjacent());
        assert!(!FramePair::new(10, 14).is_adjacent());
    }
}
