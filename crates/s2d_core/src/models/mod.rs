//! Data models for the Smart2D core.
//!
//! This module contains the plain data structures shared by the pipeline:
//! - Enums for backend kinds, scene object kinds, temp retention
//! - Backend configuration (one variant per interpolation model)
//! - Tween job description and stage machine
//! - The published frame sequence asset

mod asset;
mod backend;
mod enums;
mod tween;

// Re-export all public types
pub use asset::FrameSequenceAsset;
pub use backend::{BackendConfig, DirectModelConfig, GenerativeModelConfig, IncompleteConfig};
pub use enums::{BackendKind, ObjectKind, TempPolicy};
pub use tween::{FailureReason, FramePair, JobStage, TweenJob};
