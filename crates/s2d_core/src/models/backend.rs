//! Backend configuration for the external interpolation models.
//!
//! Each backend variant carries only the fields it needs. The generative
//! variant adds a prompt and sampling parameters on top of the paths that
//! both variants share.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::enums::BackendKind;

/// A required backend field that is empty.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{backend} backend is missing '{field}' (set it in the tween settings)")]
pub struct IncompleteConfig {
    pub backend: BackendKind,
    pub field: &'static str,
}

/// Configuration for one tween job's interpolation backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum BackendConfig {
    /// FILM `interpolator_cli`.
    #[serde(rename = "film")]
    Direct(DirectModelConfig),
    /// ToonCrafter `inference.py`.
    #[serde(rename = "tooncrafter")]
    Generative(GenerativeModelConfig),
}

impl BackendConfig {
    /// Which backend this configuration drives.
    pub fn kind(&self) -> BackendKind {
        match self {
            BackendConfig::Direct(_) => BackendKind::Film,
            BackendConfig::Generative(_) => BackendKind::ToonCrafter,
        }
    }

    /// Check that every required field is set.
    ///
    /// Pure check: touches neither the filesystem nor any process.
    pub fn validate(&self) -> Result<(), IncompleteConfig> {
        match self {
            BackendConfig::Direct(cfg) => cfg.validate(),
            BackendConfig::Generative(cfg) => cfg.validate(),
        }
    }

    /// Installation directory the backend process runs in.
    pub fn install_dir(&self) -> &Path {
        match self {
            BackendConfig::Direct(cfg) => &cfg.install_dir,
            BackendConfig::Generative(cfg) => &cfg.install_dir,
        }
    }

    /// Number of in-between frames the user asked for.
    pub fn in_betweens(&self) -> u32 {
        match self {
            BackendConfig::Direct(cfg) => cfg.times_to_interpolate,
            BackendConfig::Generative(cfg) => cfg.video_length.saturating_sub(2),
        }
    }
}

/// Direct interpolation (FILM) settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectModelConfig {
    /// FILM checkout (working directory of the CLI).
    pub install_dir: PathBuf,
    /// `saved_model` directory.
    pub model_path: PathBuf,
    /// Value of `--times_to_interpolate`.
    pub times_to_interpolate: u32,
    /// Python interpreter used to run the CLI.
    pub python: String,
}

impl DirectModelConfig {
    fn validate(&self) -> Result<(), IncompleteConfig> {
        require(BackendKind::Film, "install_dir", &self.install_dir)?;
        require(BackendKind::Film, "model_path", &self.model_path)?;
        if self.python.trim().is_empty() {
            return Err(missing(BackendKind::Film, "python"));
        }
        if self.times_to_interpolate == 0 {
            return Err(missing(BackendKind::Film, "times_to_interpolate"));
        }
        Ok(())
    }
}

/// Generative interpolation (ToonCrafter) settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerativeModelConfig {
    /// ToonCrafter checkout (working directory of `inference.py`).
    pub install_dir: PathBuf,
    /// `model.ckpt` path.
    pub checkpoint_path: PathBuf,
    /// Text prompt steering the diffusion model.
    pub prompt: String,
    /// DDIM sampling steps.
    pub steps: u32,
    /// Fixed sampling seed.
    pub seed: u64,
    /// Total frames in the generated clip, both key frames included.
    pub video_length: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub use_ddpm: bool,
    /// Python interpreter used to run `inference.py`.
    pub python: String,
}

impl GenerativeModelConfig {
    fn validate(&self) -> Result<(), IncompleteConfig> {
        let kind = BackendKind::ToonCrafter;
        require(kind, "install_dir", &self.install_dir)?;
        require(kind, "checkpoint_path", &self.checkpoint_path)?;
        if self.python.trim().is_empty() {
            return Err(missing(kind, "python"));
        }
        if self.prompt.trim().is_empty() {
            return Err(missing(kind, "prompt"));
        }
        if self.steps == 0 {
            return Err(missing(kind, "steps"));
        }
        // Two key frames plus at least one in-between.
        if self.video_length < 3 {
            return Err(missing(kind, "video_length"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(missing(kind, "resolution"));
        }
        Ok(())
    }
}

fn missing(backend: BackendKind, field: &'static str) -> IncompleteConfig {
    IncompleteConfig { backend, field }
}

fn require(backend: BackendKind, field: &'static str, path: &Path) -> Result<(), IncompleteConfig> {
    if path.as_os_str().is_empty() || path.to_string_lossy().trim().is_empty() {
        return Err(missing(backend, field));
    }
    Ok(())
}
