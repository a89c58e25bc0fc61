//! Core types for the tween pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::errors::{StepError, StepResult};
use crate::config::Settings;
use crate::logging::JobLogger;
use crate::models::{BackendKind, FailureReason, FrameSequenceAsset, JobStage, TweenJob};
use crate::scene::CameraSpec;

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (stage_name, percent_complete, message)
pub type ProgressCallback = Arc<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Read-only context passed to pipeline steps.
///
/// Mutable state goes in `JobState`.
pub struct Context {
    pub job: TweenJob,
    pub settings: Settings,
    /// Display name of the job (log file, error context).
    pub job_name: String,
    /// Job temp directory; holds the exported stills.
    pub work_dir: PathBuf,
    /// Backend output directory (`<work_dir>/output`).
    pub output_dir: PathBuf,
    /// Decoded frames (`<work_dir>/output/frames`).
    pub frames_dir: PathBuf,
    pub camera: CameraSpec,
    pub logger: Arc<JobLogger>,
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    /// Create the context for a job rooted at `work_dir`.
    pub fn new(
        job: TweenJob,
        settings: Settings,
        work_dir: impl Into<PathBuf>,
        logger: Arc<JobLogger>,
    ) -> Self {
        let work_dir = work_dir.into();
        let output_dir = work_dir.join("output");
        let frames_dir = output_dir.join("frames");
        Self {
            job_name: job.name(),
            job,
            settings,
            work_dir,
            output_dir,
            frames_dir,
            camera: CameraSpec::default(),
            logger,
            progress_callback: None,
        }
    }

    pub fn with_camera(mut self, camera: CameraSpec) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to the callback (if set) and the job log.
    pub fn report_progress(&self, stage_name: &str, percent: u32, message: &str) {
        self.logger.progress(percent);
        if let Some(ref callback) = self.progress_callback {
            callback(stage_name, percent, message);
        }
    }

    /// Sampling rate used to decode the backend artifact.
    pub fn sampling_rate_hz(&self) -> u32 {
        self.settings.tween.sampling_rate_hz
    }
}

/// Mutable job state that accumulates results from pipeline steps.
///
/// Each step writes its own section once; later steps read earlier ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobState {
    pub job_id: String,
    pub started_at: String,
    /// Current stage.
    pub stage: JobStage,
    /// Every stage entered, in order, starting with `Created`.
    pub history: Vec<JobStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoke: Option<InvokeOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decode: Option<DecodeOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<FrameSequenceAsset>,
}

impl JobState {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            started_at: chrono::Local::now().to_rfc3339(),
            stage: JobStage::Created,
            history: vec![JobStage::Created],
            export: None,
            invoke: None,
            decode: None,
            publish: None,
        }
    }

    /// Move to `next`. Only the next linear stage or `Failed` is accepted.
    pub fn enter(&mut self, next: JobStage) -> StepResult<()> {
        if !self.stage.can_enter(&next) {
            return Err(StepError::InvalidTransition {
                from: self.stage.name().to_string(),
                to: next.name().to_string(),
            });
        }
        self.history.push(next.clone());
        self.stage = next;
        Ok(())
    }

    /// Move to `Failed`. A job that already ended is left alone.
    pub fn fail(&mut self, stage: &str, cause: impl Into<String>) {
        let failed = JobStage::Failed(FailureReason {
            stage: stage.to_string(),
            cause: cause.into(),
        });
        if self.enter(failed).is_err() {
            tracing::debug!("Job {} already ended as {}", self.job_id, self.stage);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.stage.is_terminal()
    }
}

/// Stills written by the export stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOutput {
    pub first: PathBuf,
    pub second: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// What the backend produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeOutput {
    pub backend: BackendKind,
    pub artifact: PathBuf,
    /// Command line that was run.
    pub command: String,
}

/// Frames decoded from the artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeOutput {
    pub frames: Vec<PathBuf>,
    pub rate_hz: u32,
}

/// Outcome of a successful tween job.
#[derive(Debug, Clone)]
pub struct TweenRun {
    pub asset: FrameSequenceAsset,
    /// Set when the temp policy kept the job directory.
    pub retained_temp_dir: Option<PathBuf>,
    pub log_path: PathBuf,
    /// Stages the job went through, `Created` to `Succeeded`.
    pub stages: Vec<JobStage>,
}

impl TweenRun {
    pub fn retained(&self) -> Option<&Path> {
        self.retained_temp_dir.as_deref()
    }
}
