//! Runs one tween job end to end.
//!
//! Owns the job's temp directory and logger. Everything before the
//! pipeline starts is a precondition check; nothing is created on disk
//! until the job is known to be runnable.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use super::errors::{PipelineError, PipelineResult, StepError};
use super::pipeline::{CancelHandle, Pipeline};
use super::steps::{DecodeStep, ExportStep, InvokeStep, PublishStep};
use super::types::{Context, JobState, ProgressCallback, TweenRun};
use crate::config::Settings;
use crate::export::resolve_target;
use crate::logging::{JobLogger, LogConfig};
use crate::models::{FrameSequenceAsset, TempPolicy, TweenJob};
use crate::scene::{CameraSpec, TweenScene};

/// Prefix of every job temp directory.
pub const TEMP_PREFIX: &str = "s2d_tween_";

/// Shared host log sink; each job gets its own boxed copy.
pub type SharedLogCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Create the tween pipeline with all steps in order.
///
/// 1. Export - render both source frames
/// 2. Invoke - run FILM or ToonCrafter
/// 3. Decode - sample the artifact into frames
/// 4. Publish - bind the frames to a new anchor
pub fn create_tween_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(ExportStep::new())
        .with_step(InvokeStep::new())
        .with_step(DecodeStep::new())
        .with_step(PublishStep::new())
}

/// Entry point for AI tween jobs.
///
/// ```ignore
/// let orchestrator = TweenOrchestrator::new(settings);
/// let job = TweenJob::new(FramePair::from_current(10), settings.backend_config());
/// let asset = orchestrator.start(job, &mut scene)?;
/// ```
pub struct TweenOrchestrator {
    settings: Settings,
    camera: CameraSpec,
    progress_callback: Option<ProgressCallback>,
    log_callback: Option<SharedLogCallback>,
    cancel: CancelHandle,
}

impl TweenOrchestrator {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            camera: CameraSpec::default(),
            progress_callback: None,
            log_callback: None,
            cancel: CancelHandle::new(),
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Forward every job log line to the host.
    pub fn with_log_callback(mut self, callback: SharedLogCallback) -> Self {
        self.log_callback = Some(callback);
        self
    }

    /// Override the transient render camera.
    pub fn with_camera(mut self, camera: CameraSpec) -> Self {
        self.camera = camera;
        self
    }

    /// Handle that cancels the running job at its next stage boundary.
    ///
    /// The flag is scoped to one job: it is cleared when a job starts and
    /// again when it ends, so a cancel while idle has no effect.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run `job` with the temp policy from settings and return the asset.
    pub fn start(
        &self,
        job: TweenJob,
        scene: &mut dyn TweenScene,
    ) -> PipelineResult<FrameSequenceAsset> {
        let policy = self.settings.tween.temp_policy();
        self.start_with(job, scene, policy).map(|run| run.asset)
    }

    /// Run `job` and apply `policy` to its temp directory.
    ///
    /// On failure the temp directory is purged unless `policy` retains it;
    /// the error names it either way.
    pub fn start_with(
        &self,
        job: TweenJob,
        scene: &mut dyn TweenScene,
        policy: TempPolicy,
    ) -> PipelineResult<TweenRun> {
        let job_name = job.name();
        self.cancel.reset();
        self.check_runnable(&job, &*scene)?;

        let temp_root = PathBuf::from(&self.settings.paths.temp_root);
        fs::create_dir_all(&temp_root).map_err(|e| {
            PipelineError::setup_failed(
                &job_name,
                format!("Cannot create temp root {}: {}", temp_root.display(), e),
            )
        })?;
        let temp_dir = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir_in(&temp_root)
            .map_err(|e| {
                PipelineError::setup_failed(&job_name, format!("Cannot create temp dir: {}", e))
            })?;

        let logger = self.create_logger(&job_name)?;
        let log_path = logger.log_path().to_path_buf();

        let mut ctx = Context::new(job, self.settings.clone(), temp_dir.path(), logger)
            .with_camera(self.camera);
        if let Some(ref callback) = self.progress_callback {
            ctx = ctx.with_progress_callback(Arc::clone(callback));
        }
        fs::create_dir_all(&ctx.frames_dir).map_err(|e| {
            PipelineError::setup_failed(&job_name, format!("Cannot create output dirs: {}", e))
        })?;

        let mut state = JobState::new(&ctx.job.id);
        ctx.logger.info(&format!(
            "Starting {}: frames {} -> {} with {}",
            job_name,
            ctx.job.frames.first,
            ctx.job.frames.second,
            ctx.job.backend.kind()
        ));
        ctx.logger
            .debug(&format!("Temp dir: {}", ctx.work_dir.display()));

        let pipeline = create_tween_pipeline().with_cancel_handle(&self.cancel);
        let outcome = pipeline.run(&ctx, &mut state, scene);
        self.cancel.reset();

        let retained = apply_policy(temp_dir, policy, &ctx);
        match outcome {
            Ok(_) => {
                let asset = state.publish.take().ok_or_else(|| {
                    PipelineError::stage_failed(
                        &job_name,
                        "Publishing",
                        &ctx.work_dir,
                        StepError::invalid_output("No asset published"),
                    )
                })?;
                ctx.logger.success(&format!(
                    "Job finished: '{}' with {} frames",
                    asset.anchor, asset.frame_count
                ));
                ctx.logger.close();
                Ok(TweenRun {
                    asset,
                    retained_temp_dir: retained,
                    log_path,
                    stages: state.history,
                })
            }
            Err(e) => {
                ctx.logger.error(&format!("Job failed: {}", e));
                ctx.logger.close();
                Err(e)
            }
        }
    }

    /// Checks that need no side effects: backend config, sampling rate and
    /// target object.
    fn check_runnable(&self, job: &TweenJob, scene: &dyn TweenScene) -> PipelineResult<()> {
        let job_name = job.name();
        job.backend
            .validate()
            .map_err(|e| PipelineError::rejected(&job_name, e))?;
        if self.settings.tween.sampling_rate_hz == 0 {
            return Err(PipelineError::rejected(
                &job_name,
                StepError::Configuration("sampling_rate_hz must be positive".to_string()),
            ));
        }
        resolve_target(scene, job.target.as_deref())
            .map_err(|e| PipelineError::rejected(&job_name, e))?;
        Ok(())
    }

    fn create_logger(&self, job_name: &str) -> PipelineResult<Arc<JobLogger>> {
        let callback = self.log_callback.as_ref().map(|cb| {
            let cb = Arc::clone(cb);
            Box::new(move |line: &str| cb(line)) as crate::logging::LogCallback
        });
        JobLogger::new(
            job_name,
            Path::new(&self.settings.paths.logs_folder),
            LogConfig::from_settings(&self.settings.logging),
            callback,
        )
        .map(Arc::new)
        .map_err(|e| PipelineError::setup_failed(job_name, format!("Cannot create log: {}", e)))
    }
}

fn apply_policy(temp_dir: TempDir, policy: TempPolicy, ctx: &Context) -> Option<PathBuf> {
    match policy {
        TempPolicy::Retain => {
            let kept = temp_dir.keep();
            ctx.logger
                .info(&format!("Keeping temp dir {}", kept.display()));
            Some(kept)
        }
        TempPolicy::Purge => {
            if let Err(e) = temp_dir.close() {
                ctx.logger.warn(&format!("Failed to remove temp dir: {}", e));
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BackendConfig, DirectModelConfig, FramePair, ObjectKind};
    use crate::scene::MemoryScene;

    fn settings(root: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.paths.temp_root = root.join("tmp").to_string_lossy().into_owned();
        settings.paths.publish_root = root.join("pub").to_string_lossy().into_owned();
        settings.paths.logs_folder = root.join("logs").to_string_lossy().into_owned();
        settings
    }

    fn film(install_dir: &str) -> BackendConfig {
        BackendConfig::Direct(DirectModelConfig {
            install_dir: PathBuf::from(install_dir),
            model_path: PathBuf::from("/models/film"),
            times_to_interpolate: 1,
            python: "python3".to_string(),
        })
    }

    #[test]
    fn pipeline_has_four_stages_in_order() {
        assert_eq!(
            create_tween_pipeline().step_names(),
            vec!["Export", "Invoke", "Decode", "Publish"]
        );
    }

    #[test]
    fn incomplete_config_is_rejected_before_setup() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = TweenOrchestrator::new(settings(dir.path()));
        let mut scene = MemoryScene::new()
            .with_object("Drawing", ObjectKind::GreasePencil)
            .with_active("Drawing");

        let err = orchestrator
            .start(TweenJob::new(FramePair::new(1, 2), film("")), &mut scene)
            .unwrap_err();

        assert!(matches!(
            err.step_error(),
            Some(StepError::Configuration(_))
        ));
        assert!(!dir.path().join("tmp").exists());
        assert!(!dir.path().join("logs").exists());
    }

    #[test]
    fn non_drawing_target_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = TweenOrchestrator::new(settings(dir.path()));
        let mut scene = MemoryScene::new()
            .with_object("Cube", ObjectKind::Mesh)
            .with_active("Cube");

        let err = orchestrator
            .start(TweenJob::new(FramePair::new(1, 2), film("/opt/film")), &mut scene)
            .unwrap_err();

        assert!(matches!(
            err.step_error(),
            Some(StepError::UnsupportedTarget(_))
        ));
        assert!(err.temp_dir().is_none());
        assert!(scene.renders().is_empty());
    }

    #[test]
    fn zero_sampling_rate_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path());
        settings.tween.sampling_rate_hz = 0;
        let orchestrator = TweenOrchestrator::new(settings);
        let mut scene = MemoryScene::new()
            .with_object("Drawing", ObjectKind::GreasePencil)
            .with_active("Drawing");

        let err = orchestrator
            .start(TweenJob::new(FramePair::new(1, 2), film("/opt/film")), &mut scene)
            .unwrap_err();

        assert!(matches!(err, PipelineError::Rejected { .. }));
    }
}
