//! Smart bones: action constraints driven by a control bone.
//!
//! ```ignore
//! use s2d_core::rig::{synthesize, SmartBoneRequest, TransformChannel};
//!
//! let request = SmartBoneRequest::new("FaceRig", "eye_ctrl", "Blink")
//!     .with_channel(TransformChannel::LocationY)
//!     .with_frame_range(0, 12);
//! let report = synthesize(&mut scene, &request)?;
//! println!("{} bones driven", report.touched());
//! ```

mod curves;
mod synthesizer;
mod types;

use thiserror::Error;

use crate::models::ObjectKind;
use crate::scene::SceneError;

pub use curves::{bone_name_from_path, referenced_bones};
pub use synthesizer::{constraint_name, remove_smart_bone, resolve_space, synthesize};
pub use types::{
    Action, ActionConstraint, ConstraintSpace, FCurve, SmartBoneRequest, SynthesisReport,
    TransformChannel, TransformSpace,
};

/// Errors from smart bone operations.
#[derive(Error, Debug)]
pub enum RigError {
    #[error("No active object (select an armature)")]
    NoActiveObject,

    #[error("Active object '{name}' is a {kind}, not an armature")]
    NotAnArmature { name: String, kind: ObjectKind },

    #[error("Action '{0}' not found")]
    ActionNotFound(String),

    #[error("Driver bone '{bone}' not found in armature '{armature}'")]
    DriverNotFound { armature: String, bone: String },

    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Result type for smart bone operations.
pub type RigResult<T> = Result<T, RigError>;
