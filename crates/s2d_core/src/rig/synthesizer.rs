//! Smart bone constraint synthesis.
//!
//! A smart bone drives an action through action constraints: every bone
//! the action animates gets a constraint that maps the driver bone's
//! transform channel onto the action's frame range.

use super::curves::referenced_bones;
use super::types::{
    ActionConstraint, ConstraintSpace, SmartBoneRequest, SynthesisReport, TransformSpace,
};
use super::{RigError, RigResult};
use crate::models::ObjectKind;
use crate::scene::RigScene;

/// Deterministic constraint name for a (driver bone, action) pair.
pub fn constraint_name(driver_bone: &str, action: &str) -> String {
    format!("SB_{}_{}", driver_bone, action)
}

/// Install or update the smart bone constraints on the active armature.
///
/// Bones the action animates but the active armature lacks are skipped, as
/// is the driver bone itself. Re-running with the same driver and action
/// updates the existing constraints in place.
pub fn synthesize<S: RigScene + ?Sized>(
    scene: &mut S,
    request: &SmartBoneRequest,
) -> RigResult<SynthesisReport> {
    let armature = active_armature(scene)?;

    let action = scene
        .action(&request.action)
        .ok_or_else(|| RigError::ActionNotFound(request.action.clone()))?;
    check_driver(scene, request)?;

    let (space, space_fell_back) = resolve_space(scene, &request.space);
    if space_fell_back {
        tracing::warn!(
            "Custom space {:?} could not be resolved, using LOCAL",
            request.space
        );
    }

    let name = constraint_name(&request.driver_bone, &request.action);
    let skeleton = scene.bone_names(&armature)?;
    let mut report = SynthesisReport {
        constraint_name: name.clone(),
        space_fell_back,
        ..Default::default()
    };

    for bone in referenced_bones(&action) {
        if !skeleton.contains(&bone) {
            tracing::debug!("'{}' is not in '{}', skipping", bone, armature);
            report.skipped_missing.push(bone);
            continue;
        }
        if armature == request.driver_armature && bone == request.driver_bone {
            report.skipped_driver = Some(bone);
            continue;
        }

        let constraint = ActionConstraint {
            name: name.clone(),
            target: request.driver_armature.clone(),
            subtarget: request.driver_bone.clone(),
            channel: request.channel,
            space: space.clone(),
            min: request.transform_range[0],
            max: request.transform_range[1],
            action: request.action.clone(),
            frame_start: request.frame_range[0],
            frame_end: request.frame_range[1],
        };

        let exists = scene
            .constraint_names(&armature, &bone)?
            .iter()
            .any(|n| *n == name);
        if exists {
            scene.update_constraint(&armature, &bone, constraint)?;
            report.updated.push(bone);
        } else {
            scene.add_constraint(&armature, &bone, constraint)?;
            report.created.push(bone);
        }
    }

    tracing::info!(
        "Smart bone '{}': {} created, {} updated, {} missing bones skipped",
        name,
        report.created.len(),
        report.updated.len(),
        report.skipped_missing.len()
    );

    Ok(report)
}

/// Remove every constraint derived from (driver bone, action) on the
/// active armature. Returns how many were removed.
pub fn remove_smart_bone<S: RigScene + ?Sized>(
    scene: &mut S,
    driver_bone: &str,
    action: &str,
) -> RigResult<usize> {
    let armature = active_armature(scene)?;
    let name = constraint_name(driver_bone, action);

    let mut removed = 0;
    for bone in scene.bone_names(&armature)? {
        let matching: Vec<String> = scene
            .constraint_names(&armature, &bone)?
            .into_iter()
            .filter(|c| c.contains(&name))
            .collect();
        for constraint in matching {
            scene.remove_constraint(&armature, &bone, &constraint)?;
            removed += 1;
        }
    }

    tracing::info!("Removed {} '{}' constraints from '{}'", removed, name, armature);
    Ok(removed)
}

/// Resolve the requested space against the scene.
///
/// Returns the space to write and whether a custom space fell back to
/// local. Never fails.
pub fn resolve_space<S: RigScene + ?Sized>(
    scene: &S,
    space: &TransformSpace,
) -> (ConstraintSpace, bool) {
    match space {
        TransformSpace::World => (ConstraintSpace::World, false),
        TransformSpace::Local => (ConstraintSpace::Local, false),
        TransformSpace::Custom { object, subtarget } => {
            let Some(resolved) = scene.object(object) else {
                return (ConstraintSpace::Local, true);
            };
            if subtarget.is_empty() {
                return (
                    ConstraintSpace::Custom {
                        object: resolved.name,
                        subtarget: None,
                    },
                    false,
                );
            }
            if resolved.kind != ObjectKind::Armature {
                return (ConstraintSpace::Local, true);
            }
            (
                ConstraintSpace::Custom {
                    object: resolved.name,
                    subtarget: Some(subtarget.clone()),
                },
                false,
            )
        }
    }
}

fn active_armature<S: RigScene + ?Sized>(scene: &S) -> RigResult<String> {
    let active = scene.active_object().ok_or(RigError::NoActiveObject)?;
    if active.kind != ObjectKind::Armature {
        return Err(RigError::NotAnArmature {
            name: active.name,
            kind: active.kind,
        });
    }
    Ok(active.name)
}

fn check_driver<S: RigScene + ?Sized>(scene: &S, request: &SmartBoneRequest) -> RigResult<()> {
    let not_found = || RigError::DriverNotFound {
        armature: request.driver_armature.clone(),
        bone: request.driver_bone.clone(),
    };
    match scene.object(&request.driver_armature) {
        Some(o) if o.kind == ObjectKind::Armature => {}
        _ => return Err(not_found()),
    }
    if !scene
        .bone_names(&request.driver_armature)?
        .contains(&request.driver_bone)
    {
        return Err(not_found());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::types::{Action, FCurve, TransformChannel};
    use crate::scene::MemoryScene;

    fn blink() -> Action {
        Action::new(
            "Blink",
            vec![
                FCurve::new("pose.bones[\"lid.L\"].location", 1),
                FCurve::new("pose.bones[\"lid.R\"].location", 1),
                FCurve::new("pose.bones[\"Ctrl\"].location", 0),
                FCurve::new("pose.bones[\"tail\"].scale", 0),
                FCurve::new("location", 0),
            ],
        )
    }

    fn scene() -> MemoryScene {
        MemoryScene::new()
            .with_armature("Rig", &["Ctrl", "lid.L", "lid.R"])
            .with_object("Lamp", ObjectKind::Other)
            .with_armature("SpaceRig", &["root"])
            .with_action(blink())
            .with_active("Rig")
    }

    #[test]
    fn constraint_name_format() {
        assert_eq!(constraint_name("Ctrl", "Blink"), "SB_Ctrl_Blink");
    }

    #[test]
    fn creates_one_constraint_per_driven_bone() {
        let mut scene = scene();
        let report = synthesize(&mut scene, &SmartBoneRequest::new("Rig", "Ctrl", "Blink")).unwrap();

        assert_eq!(report.created, vec!["lid.L", "lid.R"]);
        assert!(report.updated.is_empty());
        assert_eq!(report.skipped_missing, vec!["tail"]);

        let c = &scene.constraints_on("Rig", "lid.L")[0];
        assert_eq!(c.name, "SB_Ctrl_Blink");
        assert_eq!(c.target, "Rig");
        assert_eq!(c.subtarget, "Ctrl");
        assert_eq!(c.action, "Blink");
        assert_eq!((c.frame_start, c.frame_end), (0, 20));
        assert_eq!(c.space, ConstraintSpace::Local);
    }

    #[test]
    fn driver_bone_never_constrains_itself() {
        let mut scene = scene();
        let report = synthesize(&mut scene, &SmartBoneRequest::new("Rig", "Ctrl", "Blink")).unwrap();

        assert_eq!(report.skipped_driver.as_deref(), Some("Ctrl"));
        assert!(scene.constraints_on("Rig", "Ctrl").is_empty());
    }

    #[test]
    fn second_run_updates_in_place() {
        let mut scene = scene();
        synthesize(&mut scene, &SmartBoneRequest::new("Rig", "Ctrl", "Blink")).unwrap();

        let second = SmartBoneRequest::new("Rig", "Ctrl", "Blink")
            .with_channel(TransformChannel::RotationZ)
            .with_transform_range(-1.0, 2.0)
            .with_frame_range(5, 30);
        let report = synthesize(&mut scene, &second).unwrap();

        assert!(report.created.is_empty());
        assert_eq!(report.updated, vec!["lid.L", "lid.R"]);
        for bone in ["lid.L", "lid.R"] {
            let constraints = scene.constraints_on("Rig", bone);
            assert_eq!(constraints.len(), 1);
            let c = &constraints[0];
            assert_eq!(c.channel, TransformChannel::RotationZ);
            assert_eq!((c.min, c.max), (-1.0, 2.0));
            assert_eq!((c.frame_start, c.frame_end), (5, 30));
        }
    }

    #[test]
    fn unresolvable_custom_space_falls_back_to_local() {
        let mut scene = scene();
        let request = SmartBoneRequest::new("Rig", "Ctrl", "Blink").with_space(
            TransformSpace::Custom {
                object: "Ghost".to_string(),
                subtarget: String::new(),
            },
        );

        let report = synthesize(&mut scene, &request).unwrap();

        assert!(report.space_fell_back);
        assert_eq!(
            scene.constraints_on("Rig", "lid.R")[0].space,
            ConstraintSpace::Local
        );
    }

    #[test]
    fn subtarget_on_non_armature_falls_back_to_local() {
        let scene = scene();
        let (space, fell_back) = resolve_space(
            &scene,
            &TransformSpace::Custom {
                object: "Lamp".to_string(),
                subtarget: "root".to_string(),
            },
        );
        assert!(fell_back);
        assert_eq!(space, ConstraintSpace::Local);
    }

    #[test]
    fn armature_custom_space_keeps_subtarget() {
        let scene = scene();
        let (space, fell_back) = resolve_space(
            &scene,
            &TransformSpace::Custom {
                object: "SpaceRig".to_string(),
                subtarget: "root".to_string(),
            },
        );
        assert!(!fell_back);
        assert_eq!(
            space,
            ConstraintSpace::Custom {
                object: "SpaceRig".to_string(),
                subtarget: Some("root".to_string()),
            }
        );
    }

    #[test]
    fn remove_deletes_matching_constraints_only() {
        let mut scene = scene().with_action(Action::new(
            "Squint",
            vec![FCurve::new("pose.bones[\"lid.L\"].scale", 0)],
        ));
        synthesize(&mut scene, &SmartBoneRequest::new("Rig", "Ctrl", "Blink")).unwrap();
        synthesize(&mut scene, &SmartBoneRequest::new("Rig", "Ctrl", "Squint")).unwrap();

        let removed = remove_smart_bone(&mut scene, "Ctrl", "Blink").unwrap();

        assert_eq!(removed, 2);
        let left = scene.constraints_on("Rig", "lid.L");
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].name, "SB_Ctrl_Squint");
        assert!(scene.constraints_on("Rig", "lid.R").is_empty());
    }

    #[test]
    fn requires_active_armature() {
        let mut scene = scene().with_active("Lamp");
        let err = synthesize(&mut scene, &SmartBoneRequest::new("Rig", "Ctrl", "Blink")).unwrap_err();
        assert!(matches!(err, RigError::NotAnArmature { .. }));
    }

    #[test]
    fn unknown_action_and_driver_are_errors() {
        let mut scene = scene();
        let err = synthesize(&mut scene, &SmartBoneRequest::new("Rig", "Ctrl", "Nope")).unwrap_err();
        assert!(matches!(err, RigError::ActionNotFound(_)));

        let err =
            synthesize(&mut scene, &SmartBoneRequest::new("Rig", "Missing", "Blink")).unwrap_err();
        assert!(matches!(err, RigError::DriverNotFound { .. }));
    }
}
