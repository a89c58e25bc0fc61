//! Frame export: render two source frames to stills.
//!
//! Rendering always goes through a transient orthographic camera so the
//! stills do not depend on whatever camera the scene uses. The camera is
//! removed and the previous binding and frame restored when the export
//! ends, whether it succeeded, failed or panicked.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::{FramePair, ObjectKind};
use crate::scene::{CameraSpec, RenderHost, SceneError, SceneObject, SceneObjects};

/// File name of the first exported still.
pub const FIRST_STILL: &str = "frame1.png";
/// File name of the second exported still.
pub const SECOND_STILL: &str = "frame2.png";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No active object (select a grease pencil object)")]
    NoTarget,

    #[error("Object '{0}' not found")]
    TargetNotFound(String),

    #[error("'{name}' is a {kind} object; only grease pencil objects can be tweened")]
    UnsupportedTarget { name: String, kind: ObjectKind },

    #[error("Could not set up render camera: {0}")]
    Camera(#[source] SceneError),

    #[error("Render of frame {frame} failed: {source}")]
    Render {
        frame: i32,
        #[source]
        source: SceneError,
    },

    #[error("Render of frame {frame} wrote nothing to {}", .path.display())]
    MissingOutput { frame: i32, path: PathBuf },

    #[error("Cannot read still {}: {message}", .path.display())]
    Unreadable { path: PathBuf, message: String },

    #[error("Stills differ in size ({}x{} vs {}x{})", .first.0, .first.1, .second.0, .second.1)]
    DimensionMismatch { first: (u32, u32), second: (u32, u32) },
}

pub type ExportResult<T> = Result<T, ExportError>;

/// The two stills of a job, ready for a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedPair {
    pub first: PathBuf,
    pub second: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Resolve the object to render and check it is paintable.
///
/// `target == None` uses the active object.
pub fn resolve_target<H: SceneObjects + ?Sized>(
    host: &H,
    target: Option<&str>,
) -> ExportResult<SceneObject> {
    let object = match target {
        Some(name) => host
            .object(name)
            .ok_or_else(|| ExportError::TargetNotFound(name.to_string()))?,
        None => host.active_object().ok_or(ExportError::NoTarget)?,
    };
    if !object.kind.is_paintable() {
        return Err(ExportError::UnsupportedTarget {
            name: object.name,
            kind: object.kind,
        });
    }
    Ok(object)
}

/// Render `pair` into `dir` as `frame1.png` and `frame2.png`.
pub fn export_pair<H: RenderHost + ?Sized>(
    host: &mut H,
    pair: FramePair,
    target: Option<&str>,
    dir: &Path,
    camera: &CameraSpec,
) -> ExportResult<ExportedPair> {
    let object = resolve_target(host, target)?;
    tracing::debug!(
        "Exporting frames {} and {} of '{}'",
        pair.first,
        pair.second,
        object.name
    );

    let first = dir.join(FIRST_STILL);
    let second = dir.join(SECOND_STILL);
    {
        let mut guard = CameraGuard::bind(host, camera).map_err(ExportError::Camera)?;
        export_frame(guard.host(), pair.first, &first)?;
        export_frame(guard.host(), pair.second, &second)?;
    }

    let first_size = dimensions(&first)?;
    let second_size = dimensions(&second)?;
    if first_size != second_size {
        return Err(ExportError::DimensionMismatch {
            first: first_size,
            second: second_size,
        });
    }

    Ok(ExportedPair {
        first,
        second,
        width: first_size.0,
        height: first_size.1,
    })
}

/// Render one frame through the currently bound camera.
pub fn export_frame<H: RenderHost + ?Sized>(
    host: &mut H,
    frame: i32,
    path: &Path,
) -> ExportResult<PathBuf> {
    let render_err = |source| ExportError::Render { frame, source };
    host.set_frame(frame).map_err(render_err)?;
    host.render_still(path).map_err(render_err)?;

    if !path.is_file() {
        return Err(ExportError::MissingOutput {
            frame,
            path: path.to_path_buf(),
        });
    }
    Ok(path.to_path_buf())
}

fn dimensions(path: &Path) -> ExportResult<(u32, u32)> {
    image::image_dimensions(path).map_err(|e| ExportError::Unreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Transient camera bound for the lifetime of the guard.
struct CameraGuard<'a, H: RenderHost + ?Sized> {
    host: &'a mut H,
    camera: String,
    previous_camera: Option<String>,
    previous_frame: i32,
}

impl<'a, H: RenderHost + ?Sized> CameraGuard<'a, H> {
    fn bind(host: &'a mut H, spec: &CameraSpec) -> Result<Self, SceneError> {
        let previous_camera = host.active_camera();
        let previous_frame = host.current_frame();
        let camera = host.add_camera(spec)?;
        let mut guard = Self {
            host,
            camera,
            previous_camera,
            previous_frame,
        };
        guard.host.set_active_camera(Some(&guard.camera))?;
        Ok(guard)
    }

    fn host(&mut self) -> &mut H {
        self.host
    }
}

impl<H: RenderHost + ?Sized> Drop for CameraGuard<'_, H> {
    fn drop(&mut self) {
        if let Err(e) = self
            .host
            .set_active_camera(self.previous_camera.as_deref())
        {
            tracing::warn!("Could not restore scene camera: {}", e);
            let _ = self.host.set_active_camera(None);
        }
        if let Err(e) = self.host.remove_object(&self.camera) {
            tracing::warn!("Could not remove render camera '{}': {}", self.camera, e);
        }
        if let Err(e) = self.host.set_frame(self.previous_frame) {
            tracing::warn!("Could not restore frame {}: {}", self.previous_frame, e);
        }
    }
}
