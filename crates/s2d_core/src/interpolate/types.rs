//! Types shared by the backend adapters.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::IncompleteConfig;

/// Errors raised while invoking an external interpolator.
#[derive(Error, Debug)]
pub enum InvokeError {
    #[error(transparent)]
    Config(#[from] IncompleteConfig),

    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} exited with code {exit_code}")]
    Failed {
        tool: String,
        exit_code: i32,
        stderr_tail: Vec<String>,
    },

    #[error("{tool} exited cleanly but produced no output at {}", .path.display())]
    MissingArtifact {
        tool: String,
        path: PathBuf,
        stderr_tail: Vec<String>,
    },

    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl InvokeError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        InvokeError::Io {
            context: context.into(),
            source,
        }
    }

    /// Exit code of the failed process, if it ran at all.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            InvokeError::Failed { exit_code, .. } => Some(*exit_code),
            InvokeError::MissingArtifact { .. } => Some(0),
            _ => None,
        }
    }

    /// Captured stderr tail, oldest line first.
    pub fn stderr_tail(&self) -> &[String] {
        match self {
            InvokeError::Failed { stderr_tail, .. }
            | InvokeError::MissingArtifact { stderr_tail, .. } => stderr_tail,
            _ => &[],
        }
    }
}

pub type InvokeResult<T> = Result<T, InvokeError>;

/// Inputs of one backend invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeRequest {
    pub first: PathBuf,
    pub second: PathBuf,
    /// Job temp directory holding both stills.
    pub work_dir: PathBuf,
    /// Where the backend writes its artifact.
    pub output_dir: PathBuf,
}

/// A fully resolved external command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Value following `flag`, if present.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `-1` when killed by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
