//! Error types for the tween pipeline.
//!
//! Errors carry context that chains through layers:
//! Job → Stage → Operation → Detail

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ConfigError;
use crate::decode::DecodeError;
use crate::export::ExportError;
use crate::interpolate::InvokeError;
use crate::models::IncompleteConfig;
use crate::publish::PublishError;

/// Top-level pipeline error with job context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The job was refused before anything was created on disk.
    #[error("Tween job '{job_name}' rejected: {source}")]
    Rejected {
        job_name: String,
        #[source]
        source: StepError,
    },

    /// A stage failed. The job ended in `Failed`.
    #[error("Tween job '{job_name}' failed at stage '{stage}': {source} (temp dir: {})", .temp_dir.display())]
    StageFailed {
        job_name: String,
        stage: String,
        temp_dir: PathBuf,
        #[source]
        source: StepError,
    },

    #[error("Tween job '{job_name}' was cancelled before stage '{stage}' (temp dir: {})", .temp_dir.display())]
    Cancelled {
        job_name: String,
        stage: String,
        temp_dir: PathBuf,
    },

    /// Failed to set up the job (temp directory, log file).
    #[error("Tween job '{job_name}' setup failed: {message}")]
    SetupFailed { job_name: String, message: String },
}

impl PipelineError {
    pub fn rejected(job_name: impl Into<String>, source: impl Into<StepError>) -> Self {
        Self::Rejected {
            job_name: job_name.into(),
            source: source.into(),
        }
    }

    pub fn stage_failed(
        job_name: impl Into<String>,
        stage: impl Into<String>,
        temp_dir: impl Into<PathBuf>,
        source: StepError,
    ) -> Self {
        Self::StageFailed {
            job_name: job_name.into(),
            stage: stage.into(),
            temp_dir: temp_dir.into(),
            source,
        }
    }

    pub fn cancelled(
        job_name: impl Into<String>,
        stage: impl Into<String>,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::Cancelled {
            job_name: job_name.into(),
            stage: stage.into(),
            temp_dir: temp_dir.into(),
        }
    }

    pub fn setup_failed(job_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            job_name: job_name.into(),
            message: message.into(),
        }
    }

    /// Stage the job was in when it stopped, if it got that far.
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::StageFailed { stage, .. } | Self::Cancelled { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// The job's temporary directory, if one was created.
    pub fn temp_dir(&self) -> Option<&Path> {
        match self {
            Self::StageFailed { temp_dir, .. } | Self::Cancelled { temp_dir, .. } => {
                Some(temp_dir)
            }
            _ => None,
        }
    }

    /// The underlying step error, if any.
    pub fn step_error(&self) -> Option<&StepError> {
        match self {
            Self::Rejected { source, .. } | Self::StageFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Error from a pipeline stage.
#[derive(Error, Debug)]
pub enum StepError {
    /// Backend configuration is incomplete.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The object to tween cannot be rendered.
    #[error("Unsupported target: {0}")]
    UnsupportedTarget(String),

    #[error("Render error: {0}")]
    Render(String),

    /// The external interpolator could not be run or did not deliver.
    #[error("{tool} failed (exit code {exit_code}): {message}")]
    BackendInvocation {
        tool: String,
        /// Raw exit code; `-1` when the process never ran or was killed.
        exit_code: i32,
        stderr_tail: Vec<String>,
        message: String,
    },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid stage transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    #[error("Output validation failed: {0}")]
    InvalidOutput(String),
}

impl StepError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Captured stderr tail of a failed backend, oldest line first.
    pub fn stderr_tail(&self) -> &[String] {
        match self {
            Self::BackendInvocation { stderr_tail, .. } => stderr_tail,
            _ => &[],
        }
    }
}

impl From<IncompleteConfig> for StepError {
    fn from(e: IncompleteConfig) -> Self {
        StepError::Configuration(e.to_string())
    }
}

impl From<ConfigError> for StepError {
    fn from(e: ConfigError) -> Self {
        StepError::Configuration(e.to_string())
    }
}

impl From<ExportError> for StepError {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::NoTarget
            | ExportError::TargetNotFound(_)
            | ExportError::UnsupportedTarget { .. } => StepError::UnsupportedTarget(e.to_string()),
            other => StepError::Render(other.to_string()),
        }
    }
}

impl From<InvokeError> for StepError {
    fn from(e: InvokeError) -> Self {
        match e {
            InvokeError::Config(inner) => inner.into(),
            InvokeError::Io { context, source } => StepError::io_error(context, source),
            other => {
                let (tool, exit_code, stderr_tail) = match &other {
                    InvokeError::Spawn { tool, .. } => (tool.clone(), -1, Vec::new()),
                    InvokeError::Failed {
                        tool,
                        exit_code,
                        stderr_tail,
                    } => (tool.clone(), *exit_code, stderr_tail.clone()),
                    InvokeError::MissingArtifact {
                        tool, stderr_tail, ..
                    } => (tool.clone(), 0, stderr_tail.clone()),
                    _ => (String::new(), -1, Vec::new()),
                };
                StepError::BackendInvocation {
                    tool,
                    exit_code,
                    stderr_tail,
                    message: other.to_string(),
                }
            }
        }
    }
}

impl From<DecodeError> for StepError {
    fn from(e: DecodeError) -> Self {
        StepError::Decode(e.to_string())
    }
}

impl From<PublishError> for StepError {
    fn from(e: PublishError) -> Self {
        StepError::Publish(e.to_string())
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
