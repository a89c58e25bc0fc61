//! Types for smart bone synthesis.

use serde::{Deserialize, Serialize};

/// One animation curve of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FCurve {
    /// RNA path of the animated property, e.g. `pose.bones["Arm"].rotation_euler`.
    pub data_path: String,
    #[serde(default)]
    pub array_index: usize,
}

impl FCurve {
    pub fn new(data_path: impl Into<String>, array_index: usize) -> Self {
        Self {
            data_path: data_path.into(),
            array_index,
        }
    }
}

/// A named, time-indexed set of animation curves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub curves: Vec<FCurve>,
}

impl Action {
    pub fn new(name: impl Into<String>, curves: Vec<FCurve>) -> Self {
        Self {
            name: name.into(),
            curves,
        }
    }
}

/// Driver transform channel read by the constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransformChannel {
    #[default]
    LocationX,
    LocationY,
    LocationZ,
    RotationX,
    RotationY,
    RotationZ,
    ScaleX,
    ScaleY,
    ScaleZ,
}

impl TransformChannel {
    /// Host identifier of the channel.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformChannel::LocationX => "LOCATION_X",
            TransformChannel::LocationY => "LOCATION_Y",
            TransformChannel::LocationZ => "LOCATION_Z",
            TransformChannel::RotationX => "ROTATION_X",
            TransformChannel::RotationY => "ROTATION_Y",
            TransformChannel::RotationZ => "ROTATION_Z",
            TransformChannel::ScaleX => "SCALE_X",
            TransformChannel::ScaleY => "SCALE_Y",
            TransformChannel::ScaleZ => "SCALE_Z",
        }
    }
}

/// Requested space the driver channel is evaluated in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "space", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransformSpace {
    World,
    #[default]
    Local,
    /// Space of another object; `subtarget` names a bone when that object
    /// is an armature. Empty strings mean "not set".
    Custom { object: String, subtarget: String },
}

/// Space actually written onto a constraint after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "space", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintSpace {
    World,
    Local,
    Custom {
        object: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subtarget: Option<String>,
    },
}

impl ConstraintSpace {
    pub fn name(&self) -> &'static str {
        match self {
            ConstraintSpace::World => "WORLD",
            ConstraintSpace::Local => "LOCAL",
            ConstraintSpace::Custom { .. } => "CUSTOM",
        }
    }
}

/// An action constraint as installed on a driven pose bone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionConstraint {
    /// `SB_<driver>_<action>`.
    pub name: String,
    /// Armature object holding the driver bone.
    pub target: String,
    /// Driver bone.
    pub subtarget: String,
    pub channel: TransformChannel,
    pub space: ConstraintSpace,
    pub min: f32,
    pub max: f32,
    pub action: String,
    pub frame_start: i32,
    pub frame_end: i32,
}

/// Inputs of one smart bone synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartBoneRequest {
    /// Armature object that owns the driver bone.
    pub driver_armature: String,
    pub driver_bone: String,
    /// Action replayed on the driven bones.
    pub action: String,
    pub channel: TransformChannel,
    pub space: TransformSpace,
    /// Driver value range mapped onto the action's frame range.
    pub transform_range: [f32; 2],
    pub frame_range: [i32; 2],
}

impl SmartBoneRequest {
    /// Request with the add-on defaults (local X location, 0..1 over frames 0..20).
    pub fn new(
        driver_armature: impl Into<String>,
        driver_bone: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            driver_armature: driver_armature.into(),
            driver_bone: driver_bone.into(),
            action: action.into(),
            channel: TransformChannel::default(),
            space: TransformSpace::default(),
            transform_range: [0.0, 1.0],
            frame_range: [0, 20],
        }
    }

    pub fn with_channel(mut self, channel: TransformChannel) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_space(mut self, space: TransformSpace) -> Self {
        self.space = space;
        self
    }

    pub fn with_transform_range(mut self, min: f32, max: f32) -> Self {
        self.transform_range = [min, max];
        self
    }

    pub fn with_frame_range(mut self, start: i32, end: i32) -> Self {
        self.frame_range = [start, end];
        self
    }
}

/// What a synthesis pass did to each referenced bone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisReport {
    /// Constraint name that was written.
    pub constraint_name: String,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    /// Bones the action animates that the active skeleton does not have.
    pub skipped_missing: Vec<String>,
    /// The driver bone itself, when the action animates it.
    pub skipped_driver: Option<String>,
    /// Whether a custom space had to fall back to local.
    pub space_fell_back: bool,
}

impl SynthesisReport {
    /// Number of constraints created or updated.
    pub fn touched(&self) -> usize {
        self.created.len() + self.updated.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_names_match_host_identifiers() {
        assert_eq!(TransformChannel::RotationZ.as_str(), "ROTATION_Z");
        let parsed: TransformChannel = serde_json::from_str("\"SCALE_Y\"").unwrap();
        assert_eq!(parsed, TransformChannel::ScaleY);
    }

    #[test]
    fn request_defaults() {
        let req = SmartBoneRequest::new("Rig", "Ctrl", "Blink");
        assert_eq!(req.channel, TransformChannel::LocationX);
        assert_eq!(req.space, TransformSpace::Local);
        assert_eq!(req.transform_range, [0.0, 1.0]);
        assert_eq!(req.frame_range, [0, 20]);
    }
}
