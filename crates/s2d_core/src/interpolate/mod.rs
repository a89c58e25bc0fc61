//! External interpolator adapters.
//!
//! One variant per backend, each with its own command line, output
//! location and required configuration:
//!
//! | Backend | Runs | Artifact |
//! |---------|------|----------|
//! | FILM | `python -m frame_interpolation.interpolator_cli` | `output/interp.mp4` |
//! | ToonCrafter | `python inference.py` + `config.yaml` | `output/samples/sample_0/video.gif` |

pub mod direct;
pub mod generative;
mod runner;
mod types;

use std::path::PathBuf;

use crate::logging::JobLogger;
use crate::models::{BackendConfig, BackendKind, DirectModelConfig, GenerativeModelConfig};

pub use runner::{run_tool, tail_len, tail_lines, DEFAULT_TAIL};
pub use types::{ExternalCommand, InvokeError, InvokeRequest, InvokeResult, ToolOutput};

/// A validated backend ready to be invoked.
#[derive(Debug, Clone, PartialEq)]
pub enum InterpolatorAdapter {
    Direct(DirectModelConfig),
    Generative(GenerativeModelConfig),
}

impl InterpolatorAdapter {
    /// Validate `config` and wrap it.
    pub fn from_config(config: &BackendConfig) -> InvokeResult<Self> {
        config.validate()?;
        Ok(match config {
            BackendConfig::Direct(cfg) => InterpolatorAdapter::Direct(cfg.clone()),
            BackendConfig::Generative(cfg) => InterpolatorAdapter::Generative(cfg.clone()),
        })
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            InterpolatorAdapter::Direct(_) => BackendKind::Film,
            InterpolatorAdapter::Generative(_) => BackendKind::ToonCrafter,
        }
    }

    /// Where the backend leaves its output for `request`.
    pub fn artifact_path(&self, request: &InvokeRequest) -> PathBuf {
        match self {
            InterpolatorAdapter::Direct(_) => direct::artifact_path(request),
            InterpolatorAdapter::Generative(_) => generative::artifact_path(request),
        }
    }

    /// Command line for `request`.
    pub fn command(&self, request: &InvokeRequest) -> ExternalCommand {
        match self {
            InterpolatorAdapter::Direct(cfg) => direct::command(cfg, request),
            InterpolatorAdapter::Generative(cfg) => generative::command(cfg, request),
        }
    }

    /// Run the backend and return the path of its artifact.
    ///
    /// Blocks until the process exits. No timeout.
    pub fn invoke(
        &self,
        request: &InvokeRequest,
        logger: Option<&JobLogger>,
    ) -> InvokeResult<PathBuf> {
        let tool = self.kind().name();

        std::fs::create_dir_all(&request.output_dir)
            .map_err(|e| InvokeError::io("creating backend output directory", e))?;
        if let InterpolatorAdapter::Generative(cfg) = self {
            generative::write_config(cfg, request)?;
        }

        let output = run_tool(tool, &self.command(request), logger)?;
        let stderr_tail = tail_lines(&output.stderr, tail_len(logger));

        if !output.success() {
            if let Some(logger) = logger {
                logger.show_tail(tool);
            }
            return Err(InvokeError::Failed {
                tool: tool.to_string(),
                exit_code: output.exit_code,
                stderr_tail,
            });
        }

        let artifact = self.artifact_path(request);
        if !artifact.is_file() {
            return Err(InvokeError::MissingArtifact {
                tool: tool.to_string(),
                path: artifact,
                stderr_tail,
            });
        }

        tracing::info!("{} produced {}", tool, artifact.display());
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn film(install_dir: &Path, python: &str) -> BackendConfig {
        BackendConfig::Direct(DirectModelConfig {
            install_dir: install_dir.to_path_buf(),
            model_path: PathBuf::from("saved_model"),
            times_to_interpolate: 1,
            python: python.to_string(),
        })
    }

    fn request(dir: &Path) -> InvokeRequest {
        InvokeRequest {
            first: dir.join("frame1.png"),
            second: dir.join("frame2.png"),
            work_dir: dir.to_path_buf(),
            output_dir: dir.join("output"),
        }
    }

    #[test]
    fn from_config_rejects_incomplete() {
        let config = film(Path::new(""), "python3");
        let err = InterpolatorAdapter::from_config(&config).unwrap_err();
        assert!(matches!(err, InvokeError::Config(_)));
    }

    #[test]
    fn unspawnable_interpreter_fails() {
        let dir = tempdir().unwrap();
        let adapter =
            InterpolatorAdapter::from_config(&film(dir.path(), "s2d-no-such-python")).unwrap();

        let err = adapter.invoke(&request(dir.path()), None).unwrap_err();
        assert!(matches!(err, InvokeError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_carries_code_and_stderr_tail() {
        let dir = tempdir().unwrap();
        // `false` ignores its arguments and exits 1.
        let adapter = InterpolatorAdapter::Direct(DirectModelConfig {
            install_dir: dir.path().to_path_buf(),
            model_path: PathBuf::from("saved_model"),
            times_to_interpolate: 1,
            python: "false".to_string(),
        });

        let err = adapter.invoke(&request(dir.path()), None).unwrap_err();
        assert!(matches!(err, InvokeError::Failed { exit_code: 1, .. }));
        assert_eq!(err.exit_code(), Some(1));
    }

    #[cfg(unix)]
    #[test]
    fn clean_exit_without_artifact_is_an_error() {
        let dir = tempdir().unwrap();
        let adapter = InterpolatorAdapter::Direct(DirectModelConfig {
            install_dir: dir.path().to_path_buf(),
            model_path: PathBuf::from("saved_model"),
            times_to_interpolate: 1,
            python: "true".to_string(),
        });

        let err = adapter.invoke(&request(dir.path()), None).unwrap_err();
        match err {
            InvokeError::MissingArtifact { path, .. } => {
                assert_eq!(path, dir.path().join("output").join("interp.mp4"))
            }
            other => panic!("expected MissingArtifact, got {:?}", other),
        }
    }

    #[test]
    fn generative_invoke_writes_config_first() {
        let dir = tempdir().unwrap();
        let adapter = InterpolatorAdapter::Generative(GenerativeModelConfig {
            install_dir: dir.path().to_path_buf(),
            checkpoint_path: PathBuf::from("model.ckpt"),
            prompt: "a cartoon animation".to_string(),
            steps: 50,
            seed: 42,
            video_length: 3,
            width: 512,
            height: 320,
            fps: 8,
            use_ddpm: false,
            python: "s2d-no-such-python".to_string(),
        });

        let _ = adapter.invoke(&request(dir.path()), None);
        assert!(dir.path().join("config.yaml").is_file());
        assert!(dir.path().join("output").is_dir());
    }
}
