//! Configuration management.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Validation on load with automatic defaults
//!
//! # Example
//!
//! ```no_run
//! use s2d_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/smart2d.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Backend: {}", config.settings().tween.backend);
//!
//! config.settings_mut().tween.times_to_interpolate = 3;
//! config.update_section(ConfigSection::Tween).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, LoggingSettings, PathSettings, Settings, SmartBoneSettings, SpaceMode,
    TweenSettings,
};
