//! FILM direct interpolation.

use std::path::PathBuf;

use super::types::{ExternalCommand, InvokeRequest};
use crate::models::DirectModelConfig;

/// Artifact FILM writes under the request's output directory.
pub const ARTIFACT: &str = "interp.mp4";

/// `python -m frame_interpolation.interpolator_cli ...` in the FILM checkout.
pub fn command(config: &DirectModelConfig, request: &InvokeRequest) -> ExternalCommand {
    let pattern = request.work_dir.join("frame*.png");
    ExternalCommand::new(&config.python)
        .arg("-m")
        .arg("frame_interpolation.interpolator_cli")
        .arg("--pattern")
        .arg(pattern.to_string_lossy())
        .arg("--model_path")
        .arg(config.model_path.to_string_lossy())
        .arg("--times_to_interpolate")
        .arg(config.times_to_interpolate.to_string())
        .arg("--output_video")
        .arg(artifact_path(request).to_string_lossy())
        .current_dir(&config.install_dir)
}

pub fn artifact_path(request: &InvokeRequest) -> PathBuf {
    request.output_dir.join(ARTIFACT)
}
