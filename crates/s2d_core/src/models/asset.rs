//! Published frame sequence asset.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// An ordered, 1-indexed image sequence bound to a scene anchor.
///
/// Only produced by a job that reached `Succeeded`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSequenceAsset {
    /// Name of the anchor object the host created.
    pub anchor: String,
    /// Directory the anchor resolves (survives the job).
    pub directory: PathBuf,
    /// Frame files in playback order.
    pub frames: Vec<PathBuf>,
    /// Declared number of frames; equals `frames.len()`.
    pub frame_count: usize,
    /// First scene frame of the sequence. Always 1.
    pub frame_start: i32,
    /// Playback duration of a single frame.
    pub frame_duration: Duration,
    pub auto_refresh: bool,
}

impl FrameSequenceAsset {
    /// Path of the 1-indexed frame `index`.
    pub fn frame(&self, index: usize) -> Option<&Path> {
        index
            .checked_sub(1)
            .and_then(|i| self.frames.get(i))
            .map(PathBuf::as_path)
    }

    /// Total playback time of the sequence.
    pub fn total_duration(&self) -> Duration {
        self.frame_duration * self.frame_count as u32
    }
}
