//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::{
    BackendConfig, BackendKind, DirectModelConfig, GenerativeModelConfig, TempPolicy,
};
use crate::rig::{SmartBoneRequest, TransformChannel, TransformSpace};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// AI tweening backend and sampling settings.
    #[serde(default)]
    pub tween: TweenSettings,

    /// Defaults for new smart bones.
    #[serde(default)]
    pub smart_bone: SmartBoneSettings,
}

impl Settings {
    /// Backend configuration for a tween job, built from `[tween]`.
    pub fn backend_config(&self) -> BackendConfig {
        self.tween.backend_config()
    }
}

/// Path configuration for temp, published sequences, and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Root folder for per-job temporary directories.
    #[serde(default = "default_temp_root")]
    pub temp_root: String,

    /// Folder that published frame sequences are moved into.
    #[serde(default = "default_publish_root")]
    pub publish_root: String,

    /// Folder for job log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_temp_root() -> String {
    ".temp".to_string()
}

fn default_publish_root() -> String {
    "tween_sequences".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            temp_root: default_temp_root(),
            publish_root: default_publish_root(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of external-tool output lines kept for error reports.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Global tracing filter directive.
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
            level: default_level(),
        }
    }
}

/// AI tweening configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweenSettings {
    /// Interpolation model.
    #[serde(default)]
    pub backend: BackendKind,

    /// FILM checkout.
    #[serde(default)]
    pub film_path: String,

    /// ToonCrafter checkout.
    #[serde(default)]
    pub tooncrafter_path: String,

    /// FILM `saved_model` directory or ToonCrafter `model.ckpt`.
    #[serde(default)]
    pub model_path: String,

    /// Prompt for the generative model.
    #[serde(default = "default_prompt")]
    pub prompt: String,

    /// Number of in-between frames to generate.
    #[serde(default = "default_times")]
    pub times_to_interpolate: u32,

    /// Rate the output artifact is sampled at when decoding.
    #[serde(default = "default_rate")]
    pub sampling_rate_hz: u32,

    #[serde(default = "default_steps")]
    pub steps: u32,

    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_rate")]
    pub fps: u32,

    #[serde(default)]
    pub use_ddpm: bool,

    /// Python interpreter for both backends.
    #[serde(default = "default_python")]
    pub python: String,

    /// ffmpeg executable.
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    /// Keep job temp directories after the job ends.
    #[serde(default)]
    pub keep_temp: bool,
}

fn default_prompt() -> String {
    "a cartoon animation".to_string()
}

fn default_times() -> u32 {
    1
}

fn default_rate() -> u32 {
    8
}

fn default_steps() -> u32 {
    50
}

fn default_seed() -> u64 {
    42
}

fn default_width() -> u32 {
    512
}

fn default_height() -> u32 {
    320
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

impl Default for TweenSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            film_path: String::new(),
            tooncrafter_path: String::new(),
            model_path: String::new(),
            prompt: default_prompt(),
            times_to_interpolate: default_times(),
            sampling_rate_hz: default_rate(),
            steps: default_steps(),
            seed: default_seed(),
            width: default_width(),
            height: default_height(),
            fps: default_rate(),
            use_ddpm: false,
            python: default_python(),
            ffmpeg: default_ffmpeg(),
            keep_temp: false,
        }
    }
}

impl TweenSettings {
    /// Backend configuration for the selected model.
    ///
    /// Empty paths are carried through as-is; `BackendConfig::validate`
    /// reports them.
    pub fn backend_config(&self) -> BackendConfig {
        match self.backend {
            BackendKind::Film => BackendConfig::Direct(DirectModelConfig {
                install_dir: PathBuf::from(&self.film_path),
                model_path: PathBuf::from(&self.model_path),
                times_to_interpolate: self.times_to_interpolate,
                python: self.python.clone(),
            }),
            BackendKind::ToonCrafter => BackendConfig::Generative(GenerativeModelConfig {
                install_dir: PathBuf::from(&self.tooncrafter_path),
                checkpoint_path: PathBuf::from(&self.model_path),
                prompt: self.prompt.clone(),
                steps: self.steps,
                seed: self.seed,
                // Both key frames are part of the generated clip.
                video_length: self.times_to_interpolate.saturating_add(2),
                width: self.width,
                height: self.height,
                fps: self.fps,
                use_ddpm: self.use_ddpm,
                python: self.python.clone(),
            }),
        }
    }

    pub fn temp_policy(&self) -> TempPolicy {
        if self.keep_temp {
            TempPolicy::Retain
        } else {
            TempPolicy::Purge
        }
    }
}

/// Space mode stored in settings; the object and bone live beside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpaceMode {
    World,
    #[default]
    Local,
    Custom,
}

/// Defaults applied to new smart bones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartBoneSettings {
    #[serde(default)]
    pub channel: TransformChannel,

    #[serde(default)]
    pub space: SpaceMode,

    /// Custom space object.
    #[serde(default)]
    pub space_object: String,

    /// Custom space bone, when the object is an armature.
    #[serde(default)]
    pub space_subtarget: String,

    #[serde(default)]
    pub transform_min: f32,

    #[serde(default = "default_transform_max")]
    pub transform_max: f32,

    #[serde(default)]
    pub frame_min: i32,

    #[serde(default = "default_frame_max")]
    pub frame_max: i32,
}

fn default_transform_max() -> f32 {
    1.0
}

fn default_frame_max() -> i32 {
    20
}

impl Default for SmartBoneSettings {
    fn default() -> Self {
        Self {
            channel: TransformChannel::default(),
            space: SpaceMode::default(),
            space_object: String::new(),
            space_subtarget: String::new(),
            transform_min: 0.0,
            transform_max: default_transform_max(),
            frame_min: 0,
            frame_max: default_frame_max(),
        }
    }
}

impl SmartBoneSettings {
    pub fn transform_space(&self) -> TransformSpace {
        match self.space {
            SpaceMode::World => TransformSpace::World,
            SpaceMode::Local => TransformSpace::Local,
            SpaceMode::Custom => TransformSpace::Custom {
                object: self.space_object.clone(),
                subtarget: self.space_subtarget.clone(),
            },
        }
    }

    /// Synthesis request for a driver and action using these defaults.
    pub fn request(
        &self,
        driver_armature: impl Into<String>,
        driver_bone: impl Into<String>,
        action: impl Into<String>,
    ) -> SmartBoneRequest {
        SmartBoneRequest::new(driver_armature, driver_bone, action)
            .with_channel(self.channel)
            .with_space(self.transform_space())
            .with_transform_range(self.transform_min, self.transform_max)
            .with_frame_range(self.frame_min, self.frame_max)
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Logging,
    Tween,
    SmartBone,
}

impl ConfigSection {
    pub const ALL: [ConfigSection; 4] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Tween,
        ConfigSection::SmartBone,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Tween => "tween",
            ConfigSection::SmartBone => "smart_bone",
        }
    }

    fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "# Temp, published sequence and log directories",
            ConfigSection::Logging => "# Logging configuration",
            ConfigSection::Tween => "# AI tweening backend",
            ConfigSection::SmartBone => "# Smart bone defaults",
        }
    }

    pub(super) fn header(&self) -> String {
        format!("{}\n[{}]\n", self.comment(), self.table_name())
    }
}
