//! Tween job orchestration.
//!
//! A tween job runs as a fixed pipeline of steps, each owning one stage
//! of the job's lifecycle:
//!
//! ```text
//! TweenOrchestrator::start
//!     ├── precondition checks (config, sampling rate, target)
//!     ├── temp dir + job log
//!     └── Pipeline
//!         ├── Step: Export    (Exporting)
//!         ├── Step: Invoke    (InvokingBackend)
//!         ├── Step: Decode    (DecodingOutput)
//!         └── Step: Publish   (Publishing)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use s2d_core::orchestrator::TweenOrchestrator;
//!
//! let orchestrator = TweenOrchestrator::new(settings.clone())
//!     .with_progress_callback(Arc::new(|stage, pct, msg| println!("{stage} {pct}% {msg}")));
//! let job = TweenJob::new(FramePair::from_current(10), settings.backend_config());
//! let asset = orchestrator.start(job, &mut scene)?;
//! println!("{} frames on '{}'", asset.frame_count, asset.anchor);
//! ```

mod errors;
mod pipeline;
mod step;
pub mod steps;
mod tween;
mod types;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{CancelHandle, Pipeline, PipelineRunResult};
pub use step::PipelineStep;
pub use steps::{DecodeStep, ExportStep, InvokeStep, PublishStep};
pub use tween::{create_tween_pipeline, SharedLogCallback, TweenOrchestrator, TEMP_PREFIX};
pub use types::{
    Context, DecodeOutput, ExportOutput, InvokeOutput, JobState, ProgressCallback, TweenRun,
};
