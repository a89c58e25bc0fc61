//! Publish a decoded frame sequence as a scene anchor.
//!
//! Frames are moved out of the job's temporary directory first, so the
//! published sequence outlives the job regardless of the temp policy.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::models::FrameSequenceAsset;
use crate::scene::{AnchorHost, ImageAnchor, SceneError};

pub const DEFAULT_ANCHOR_NAME: &str = "AI_Interp_Seq";
pub const DEFAULT_IMAGE_NAME: &str = "AIInterpSeq";
const DISPLAY_SIZE: f32 = 5.0;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("No frames to publish")]
    NoFrames,

    #[error("Frame {} is not inside {}", .frame.display(), .directory.display())]
    OutsideDirectory { frame: PathBuf, directory: PathBuf },

    #[error("Frame {} is missing after relocation", .0.display())]
    MissingFrame(PathBuf),

    #[error("Publish directory {} already exists", .0.display())]
    DestinationExists(PathBuf),

    #[error("Could not move frames to {}: {source}", .destination.display())]
    Relocate {
        destination: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Host refused to create anchor: {0}")]
    Anchor(#[from] SceneError),
}

pub type PublishResult<T> = Result<T, PublishError>;

/// Where and how to publish one job's frames.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishRequest {
    pub anchor_name: String,
    pub image_name: String,
    pub job_id: String,
    /// Parent of the per-job publish directory.
    pub publish_root: PathBuf,
    pub frame_duration: Duration,
}

impl PublishRequest {
    pub fn new(job_id: impl Into<String>, publish_root: impl Into<PathBuf>, rate_hz: u32) -> Self {
        Self {
            anchor_name: DEFAULT_ANCHOR_NAME.to_string(),
            image_name: DEFAULT_IMAGE_NAME.to_string(),
            job_id: job_id.into(),
            publish_root: publish_root.into(),
            frame_duration: frame_duration(rate_hz),
        }
    }

    /// `<publish_root>/<anchor>_<job_id>`.
    pub fn destination(&self) -> PathBuf {
        self.publish_root
            .join(format!("{}_{}", self.anchor_name, self.job_id))
    }
}

/// Playback time of one frame sampled at `rate_hz`.
pub fn frame_duration(rate_hz: u32) -> Duration {
    if rate_hz == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(1.0 / rate_hz as f64)
}

/// Relocate `frames` and bind them to a new anchor.
///
/// All frames must share one directory, and each must be on disk after the
/// move before the anchor is created. Every call creates a new anchor.
/// If the host refuses the anchor, the relocated frames stay on disk.
pub fn publish<H: AnchorHost + ?Sized>(
    frames: &[PathBuf],
    request: &PublishRequest,
    host: &mut H,
) -> PublishResult<FrameSequenceAsset> {
    let source_dir = frames
        .first()
        .and_then(|f| f.parent())
        .ok_or(PublishError::NoFrames)?
        .to_path_buf();
    for frame in frames {
        if frame.parent() != Some(source_dir.as_path()) {
            return Err(PublishError::OutsideDirectory {
                frame: frame.clone(),
                directory: source_dir,
            });
        }
    }

    let destination = request.destination();
    relocate_dir(&source_dir, &destination)?;
    let mut relocated = Vec::with_capacity(frames.len());
    for frame in frames {
        let moved = frame
            .file_name()
            .map(|name| destination.join(name))
            .filter(|path| path.is_file())
            .ok_or_else(|| PublishError::MissingFrame(frame.clone()))?;
        relocated.push(moved);
    }
    let first_frame = relocated.first().cloned().ok_or(PublishError::NoFrames)?;

    let anchor = ImageAnchor {
        name: request.anchor_name.clone(),
        image_name: request.image_name.clone(),
        directory: destination.clone(),
        first_frame,
        frame_start: 1,
        frame_count: relocated.len(),
        auto_refresh: true,
        display_size: DISPLAY_SIZE,
    };
    let anchor_name = host.create_image_anchor(&anchor)?;

    tracing::info!(
        "Published {} frames as '{}' from {}",
        relocated.len(),
        anchor_name,
        destination.display()
    );

    Ok(FrameSequenceAsset {
        anchor: anchor_name,
        directory: destination,
        frame_count: relocated.len(),
        frames: relocated,
        frame_start: 1,
        frame_duration: request.frame_duration,
        auto_refresh: true,
    })
}

/// Move `from` to `to`, copying when a rename cannot cross filesystems.
fn relocate_dir(from: &Path, to: &Path) -> PublishResult<()> {
    if to.exists() {
        return Err(PublishError::DestinationExists(to.to_path_buf()));
    }
    let relocate_err = |source| PublishError::Relocate {
        destination: to.to_path_buf(),
        source,
    };

    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(relocate_err)?;
    }
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    tracing::debug!("Rename failed, copying {} to {}", from.display(), to.display());
    copy_dir(from, to).map_err(relocate_err)?;
    if let Err(e) = fs::remove_dir_all(from) {
        tracing::warn!("Could not remove {}: {}", from.display(), e);
    }
    Ok(())
}

fn copy_dir(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MemoryScene, SceneObjects};
    use tempfile::tempdir;

    fn frames_in(dir: &Path, count: usize) -> Vec<PathBuf> {
        fs::create_dir_all(dir).unwrap();
        (1..=count)
            .map(|i| {
                let path = dir.join(format!("frame{:03}.png", i));
                fs::write(&path, b"png").unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn frame_duration_is_reciprocal_of_rate() {
        assert_eq!(frame_duration(8), Duration::from_millis(125));
        assert_eq!(frame_duration(0), Duration::ZERO);
    }

    #[test]
    fn publishes_relocated_sequence() {
        let temp = tempdir().unwrap();
        let publish_root = tempdir().unwrap();
        let frames = frames_in(&temp.path().join("output/frames"), 5);
        let mut scene = MemoryScene::new();
        let request = PublishRequest::new("abc123", publish_root.path(), 8);

        let asset = publish(&frames, &request, &mut scene).unwrap();

        let expected_dir = publish_root.path().join("AI_Interp_Seq_abc123");
        assert_eq!(asset.directory, expected_dir);
        assert_eq!(asset.frame_count, 5);
        assert_eq!(asset.frame_start, 1);
        assert_eq!(asset.frame(1), Some(expected_dir.join("frame001.png").as_path()));
        assert!(asset.frames.iter().all(|f| f.is_file()));
        assert!(!temp.path().join("output/frames").exists());

        let anchor = &scene.anchors()[0];
        assert_eq!(anchor.name, "AI_Interp_Seq");
        assert_eq!(anchor.frame_count, 5);
        assert_eq!(anchor.display_size, 5.0);
        assert!(anchor.auto_refresh);
    }

    #[test]
    fn publishing_twice_creates_two_anchors() {
        let temp = tempdir().unwrap();
        let publish_root = tempdir().unwrap();
        let mut scene = MemoryScene::new();

        let a = frames_in(&temp.path().join("a"), 2);
        let b = frames_in(&temp.path().join("b"), 3);
        let first = publish(&a, &PublishRequest::new("one", publish_root.path(), 8), &mut scene)
            .unwrap();
        let second = publish(&b, &PublishRequest::new("two", publish_root.path(), 8), &mut scene)
            .unwrap();

        assert_eq!(scene.anchors().len(), 2);
        assert_ne!(first.anchor, second.anchor);
        assert_eq!(second.anchor, "AI_Interp_Seq.001");
        assert!(scene.object(&first.anchor).is_some());
    }

    #[test]
    fn anchor_failure_keeps_relocated_frames() {
        let temp = tempdir().unwrap();
        let publish_root = tempdir().unwrap();
        let frames = frames_in(&temp.path().join("frames"), 2);
        let mut scene = MemoryScene::new().failing_anchors("read-only scene");
        let request = PublishRequest::new("job", publish_root.path(), 8);

        let err = publish(&frames, &request, &mut scene).unwrap_err();

        assert!(matches!(err, PublishError::Anchor(_)));
        assert!(request.destination().join("frame002.png").is_file());
    }

    #[test]
    fn missing_frame_is_caught_before_anchor() {
        let temp = tempdir().unwrap();
        let publish_root = tempdir().unwrap();
        let mut frames = frames_in(&temp.path().join("frames"), 2);
        frames.push(temp.path().join("frames/frame003.png"));
        let mut scene = MemoryScene::new();
        let request = PublishRequest::new("job", publish_root.path(), 8);

        let err = publish(&frames, &request, &mut scene).unwrap_err();

        assert!(matches!(err, PublishError::MissingFrame(ref f) if f.ends_with("frame003.png")));
        assert!(scene.anchors().is_empty());
        assert!(request.destination().join("frame001.png").is_file());
    }

    #[test]
    fn empty_frame_list_is_rejected() {
        let publish_root = tempdir().unwrap();
        let mut scene = MemoryScene::new();
        let err = publish(&[], &PublishRequest::new("job", publish_root.path(), 8), &mut scene)
            .unwrap_err();
        assert!(matches!(err, PublishError::NoFrames));
    }

    #[test]
    fn copy_dir_copies_nested_files() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        fs::create_dir_all(src.path().join("nested")).unwrap();
        fs::write(src.path().join("nested/a.png"), b"x").unwrap();
        fs::write(src.path().join("b.png"), b"y").unwrap();

        let target = dst.path().join("copy");
        copy_dir(src.path(), &target).unwrap();

        assert!(target.join("nested/a.png").is_file());
        assert!(target.join("b.png").is_file());
    }
}
