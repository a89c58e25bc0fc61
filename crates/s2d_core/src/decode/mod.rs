//! Decode a backend artifact into numbered still frames with ffmpeg.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::interpolate::{run_tool, tail_len, tail_lines, ExternalCommand, InvokeError};
use crate::logging::JobLogger;

/// Output file pattern handed to ffmpeg.
pub const FRAME_PATTERN: &str = "frame%03d.png";

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Artifact {} does not exist", .0.display())]
    MissingArtifact(PathBuf),

    #[error("Sampling rate must be positive")]
    InvalidRate,

    #[error("Failed to start ffmpeg: {0}")]
    Spawn(String),

    #[error("ffmpeg exited with code {exit_code}")]
    Failed {
        exit_code: i32,
        stderr_tail: Vec<String>,
    },

    #[error("ffmpeg produced no frames in {}", .0.display())]
    NoFrames(PathBuf),

    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

pub type DecodeResult<T> = Result<T, DecodeError>;

/// ffmpeg-based post-processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameDecoder {
    ffmpeg: String,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FrameDecoder {
    /// Decoder running the given ffmpeg executable.
    pub fn new(ffmpeg: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }

    pub fn command(&self, artifact: &Path, rate_hz: u32, out_dir: &Path) -> ExternalCommand {
        ExternalCommand::new(&self.ffmpeg)
            .arg("-y")
            .arg("-i")
            .arg(artifact.to_string_lossy())
            .arg("-vf")
            .arg(format!("fps={}", rate_hz))
            .arg(out_dir.join(FRAME_PATTERN).to_string_lossy())
    }

    /// Sample `artifact` at `rate_hz` into `out_dir/frameNNN.png`.
    ///
    /// Returns the frames in ffmpeg's numbering order.
    pub fn decode(
        &self,
        artifact: &Path,
        rate_hz: u32,
        out_dir: &Path,
        logger: Option<&JobLogger>,
    ) -> DecodeResult<Vec<PathBuf>> {
        if !artifact.is_file() {
            return Err(DecodeError::MissingArtifact(artifact.to_path_buf()));
        }
        if rate_hz == 0 {
            return Err(DecodeError::InvalidRate);
        }
        fs::create_dir_all(out_dir).map_err(|source| DecodeError::Io {
            context: "creating frames directory".to_string(),
            source,
        })?;

        let command = self.command(artifact, rate_hz, out_dir);
        let output = run_tool("ffmpeg", &command, logger).map_err(|e| match e {
            InvokeError::Spawn { source, .. } => DecodeError::Spawn(source.to_string()),
            other => DecodeError::Spawn(other.to_string()),
        })?;

        if !output.success() {
            if let Some(logger) = logger {
                logger.show_tail("ffmpeg");
            }
            return Err(DecodeError::Failed {
                exit_code: output.exit_code,
                stderr_tail: tail_lines(&output.stderr, tail_len(logger)),
            });
        }

        let frames = collect_frames(out_dir)?;
        if frames.is_empty() {
            return Err(DecodeError::NoFrames(out_dir.to_path_buf()));
        }

        tracing::info!("Decoded {} frames at {} Hz", frames.len(), rate_hz);
        Ok(frames)
    }
}

/// Numeric index of a `frameNNN.png` file name.
pub fn frame_index(path: &Path) -> Option<u32> {
    let name = path.file_name()?.to_str()?;
    let digits = name.strip_prefix("frame")?.strip_suffix(".png")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// All `frameNNN.png` files in `dir`, ordered by index.
pub fn collect_frames(dir: &Path) -> DecodeResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| DecodeError::Io {
        context: format!("reading {}", dir.display()),
        source,
    })?;

    let mut frames: Vec<(u32, PathBuf)> = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| DecodeError::Io {
                context: format!("listing {}", dir.display()),
                source,
            })?
            .path();
        if let Some(index) = frame_index(&path) {
            frames.push((index, path));
        }
    }
    frames.sort_by_key(|(index, _)| *index);

    Ok(frames.into_iter().map(|(_, path)| path).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_frame_indices() {
        assert_eq!(frame_index(Path::new("/x/frame001.png")), Some(1));
        assert_eq!(frame_index(Path::new("frame1000.png")), Some(1000));
        assert_eq!(frame_index(Path::new("frame.png")), None);
        assert_eq!(frame_index(Path::new("frame01.jpg")), None);
        assert_eq!(frame_index(Path::new("thumb001.png")), None);
    }

    #[test]
    fn collects_numerically_not_lexically() {
        let dir = tempdir().unwrap();
        for name in ["frame010.png", "frame002.png", "frame1000.png", "frame001.png", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let frames = collect_frames(dir.path()).unwrap();
        let names: Vec<_> = frames
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["frame001.png", "frame002.png", "frame010.png", "frame1000.png"]
        );
    }

    #[test]
    fn listing_errors_are_reported() {
        let dir = tempdir().unwrap();
        let err = collect_frames(&dir.path().join("gone")).unwrap_err();
        assert!(matches!(err, DecodeError::Io { .. }));
    }

    #[test]
    fn builds_ffmpeg_command() {
        let cmd = FrameDecoder::default().command(
            Path::new("/job/output/interp.mp4"),
            8,
            Path::new("/job/output/frames"),
        );
        assert_eq!(cmd.program, "ffmpeg");
        assert_eq!(
            cmd.args,
            vec![
                "-y",
                "-i",
                "/job/output/interp.mp4",
                "-vf",
                "fps=8",
                "/job/output/frames/frame%03d.png"
            ]
        );
    }

    #[test]
    fn missing_artifact_is_rejected() {
        let dir = tempdir().unwrap();
        let err = FrameDecoder::default()
            .decode(&dir.path().join("none.mp4"), 8, dir.path(), None)
            .unwrap_err();
        assert!(matches!(err, DecodeError::MissingArtifact(_)));
    }

    #[cfg(unix)]
    #[test]
    fn zero_frames_is_an_error() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join("interp.mp4");
        fs::write(&artifact, b"not really a video").unwrap();

        // `true` exits 0 without writing anything.
        let err = FrameDecoder::new("true")
            .decode(&artifact, 8, &dir.path().join("frames"), None)
            .unwrap_err();
        assert!(matches!(err, DecodeError::NoFrames(_)));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_an_error() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join("interp.mp4");
        fs::write(&artifact, b"").unwrap();

        let err = FrameDecoder::new("false")
            .decode(&artifact, 8, &dir.path().join("frames"), None)
            .unwrap_err();
        assert!(matches!(err, DecodeError::Failed { exit_code: 1, .. }));
    }
}
