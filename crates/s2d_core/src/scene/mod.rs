//! Host scene collaborator interfaces.
//!
//! The core never reaches into a scene graph directly. Everything it needs
//! from the host (object lookup, rendering, anchors, bones and constraints)
//! goes through the traits in this module, resolved by name at call time.
//!
//! ```text
//! SceneObjects ──┬── RenderHost ──┐
//!                │                ├── TweenScene (export + publish)
//!                ├── AnchorHost ──┘
//!                └── RigScene (smart bones)
//! ```
//!
//! [`MemoryScene`] implements all of them in memory for tests and headless
//! hosts.

mod memory;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ObjectKind;
use crate::rig::{Action, ActionConstraint};

pub use memory::{MemoryScene, RenderRecord};

/// Error reported by the host scene.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("Object '{0}' not found")]
    ObjectNotFound(String),

    #[error("Bone '{bone}' not found in '{armature}'")]
    BoneNotFound { armature: String, bone: String },

    #[error("Constraint '{name}' not found on bone '{bone}'")]
    ConstraintNotFound { bone: String, name: String },

    #[error("Render failed: {0}")]
    Render(String),

    #[error("{0}")]
    Host(String),
}

/// Result type for host scene calls.
pub type SceneResult<T> = Result<T, SceneError>;

/// A named object in the scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    pub kind: ObjectKind,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Transient render camera parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraSpec {
    pub location: [f32; 3],
    pub orthographic: bool,
    pub ortho_scale: f32,
}

impl Default for CameraSpec {
    fn default() -> Self {
        Self {
            location: [0.0, 0.0, 10.0],
            orthographic: true,
            ortho_scale: 10.0,
        }
    }
}

/// Image-sequence anchor the publisher asks the host to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnchor {
    /// Requested object name. Hosts may uniquify it.
    pub name: String,
    /// Name of the image datablock backing the anchor.
    pub image_name: String,
    /// Directory the sequence resolves from.
    pub directory: PathBuf,
    /// First file of the sequence.
    pub first_frame: PathBuf,
    pub frame_start: i32,
    pub frame_count: usize,
    pub auto_refresh: bool,
    pub display_size: f32,
}

/// Object lookup shared by every host capability.
pub trait SceneObjects {
    /// The active (selected) object.
    fn active_object(&self) -> Option<SceneObject>;

    /// Resolve an object by name.
    fn object(&self, name: &str) -> Option<SceneObject>;
}

/// Render-to-file capability.
pub trait RenderHost: SceneObjects {
    /// Name of the camera the scene currently renders through.
    fn active_camera(&self) -> Option<String>;

    /// Bind the scene camera (`None` unbinds).
    fn set_active_camera(&mut self, camera: Option<&str>) -> SceneResult<()>;

    /// Create a camera object and return its name.
    fn add_camera(&mut self, spec: &CameraSpec) -> SceneResult<String>;

    /// Remove an object from the scene.
    fn remove_object(&mut self, name: &str) -> SceneResult<()>;

    fn current_frame(&self) -> i32;

    fn set_frame(&mut self, frame: i32) -> SceneResult<()>;

    /// Render the current frame through the active camera to `path`.
    fn render_still(&mut self, path: &Path) -> SceneResult<()>;
}

/// Anchor creation capability.
pub trait AnchorHost: SceneObjects {
    /// Create a new anchor object; returns the name it was given.
    fn create_image_anchor(&mut self, anchor: &ImageAnchor) -> SceneResult<String>;
}

/// Everything a tween job needs from the host.
pub trait TweenScene: RenderHost + AnchorHost {}

impl<T: RenderHost + AnchorHost + ?Sized> TweenScene for T {}

/// Skeleton, action and constraint access for smart bones.
pub trait RigScene: SceneObjects {
    /// Resolve an action by name.
    fn action(&self, name: &str) -> Option<Action>;

    /// Pose bone names of an armature, in hierarchy order.
    fn bone_names(&self, armature: &str) -> SceneResult<Vec<String>>;

    /// Names of the constraints on a pose bone, in stack order.
    fn constraint_names(&self, armature: &str, bone: &str) -> SceneResult<Vec<String>>;

    /// Look up a single action constraint by name.
    fn constraint(&self, armature: &str, bone: &str, name: &str) -> Option<ActionConstraint>;

    /// Append a new action constraint to a pose bone.
    fn add_constraint(
        &mut self,
        armature: &str,
        bone: &str,
        constraint: ActionConstraint,
    ) -> SceneResult<()>;

    /// Overwrite the fields of the existing constraint named `constraint.name`.
    fn update_constraint(
        &mut self,
        armature: &str,
        bone: &str,
        constraint: ActionConstraint,
    ) -> SceneResult<()>;

    /// Remove a constraint by name.
    fn remove_constraint(&mut self, armature: &str, bone: &str, name: &str) -> SceneResult<()>;
}
