//! Bone references inside action curve paths.

use super::types::Action;

const POSE_BONES: &str = "pose.bones";

/// Extract the bone name from a pose-bone curve path.
///
/// `pose.bones["Upper Arm"].rotation_euler` yields `Upper Arm`. Paths that
/// do not address a pose bone (object transforms, shape keys, custom
/// properties on the armature) yield `None`.
pub fn bone_name_from_path(data_path: &str) -> Option<&str> {
    let start = data_path.find(POSE_BONES)? + POSE_BONES.len();
    let rest = data_path[start..].strip_prefix('[')?;
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let body = &rest[quote.len_utf8()..];
    let end = body.find(quote)?;
    Some(&body[..end])
}

/// Bones an action animates, deduplicated in first-seen order.
pub fn referenced_bones(action: &Action) -> Vec<String> {
    let mut bones: Vec<String> = Vec::new();
    for curve in &action.curves {
        if let Some(bone) = bone_name_from_path(&curve.data_path) {
            if !bones.iter().any(|b| b == bone) {
                bones.push(bone.to_string());
            }
        }
    }
    bones
}
