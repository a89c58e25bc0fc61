//! In-memory scene implementing every host trait.
//!
//! Used by the test suites and by headless callers that only need files on
//! disk. Rendering writes a flat PNG of the configured resolution.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};

use super::{
    AnchorHost, CameraSpec, ImageAnchor, RenderHost, RigScene, SceneError, SceneObject,
    SceneObjects, SceneResult,
};
use crate::models::ObjectKind;
use crate::rig::{Action, ActionConstraint};

#[derive(Debug, Clone)]
struct MemoryBone {
    name: String,
    constraints: Vec<ActionConstraint>,
}

#[derive(Debug, Clone)]
struct MemoryObject {
    name: String,
    kind: ObjectKind,
    bones: Vec<MemoryBone>,
}

/// A render the scene performed.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRecord {
    pub frame: i32,
    pub camera: Option<String>,
    pub path: PathBuf,
}

/// Scene graph kept entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryScene {
    objects: Vec<MemoryObject>,
    active: Option<String>,
    camera: Option<String>,
    frame: i32,
    actions: HashMap<String, Action>,
    anchors: Vec<ImageAnchor>,
    renders: Vec<RenderRecord>,
    resolution: (u32, u32),
    frame_resolutions: HashMap<i32, (u32, u32)>,
    failing_frames: HashSet<i32>,
    anchor_failure: Option<String>,
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryScene {
    /// Empty scene at frame 1 rendering 512x320 stills.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            active: None,
            camera: None,
            frame: 1,
            actions: HashMap::new(),
            anchors: Vec::new(),
            renders: Vec::new(),
            resolution: (512, 320),
            frame_resolutions: HashMap::new(),
            failing_frames: HashSet::new(),
            anchor_failure: None,
        }
    }

    /// Add an object without bones.
    pub fn with_object(mut self, name: &str, kind: ObjectKind) -> Self {
        self.insert_object(name, kind, &[]);
        self
    }

    /// Add an armature with the given pose bones.
    pub fn with_armature(mut self, name: &str, bones: &[&str]) -> Self {
        self.insert_object(name, ObjectKind::Armature, bones);
        self
    }

    /// Add a camera object and bind it as the scene camera.
    pub fn with_camera(mut self, name: &str) -> Self {
        self.insert_object(name, ObjectKind::Camera, &[]);
        self.camera = Some(name.to_string());
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.insert(action.name.clone(), action);
        self
    }

    /// Make `name` the active object.
    pub fn with_active(mut self, name: &str) -> Self {
        self.active = Some(name.to_string());
        self
    }

    pub fn with_frame(mut self, frame: i32) -> Self {
        self.frame = frame;
        self
    }

    /// Default render resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = (width, height);
        self
    }

    /// Override the render resolution of one frame.
    pub fn with_frame_resolution(mut self, frame: i32, width: u32, height: u32) -> Self {
        self.frame_resolutions.insert(frame, (width, height));
        self
    }

    /// Make rendering `frame` fail.
    pub fn failing_render_at(mut self, frame: i32) -> Self {
        self.failing_frames.insert(frame);
        self
    }

    /// Make anchor creation fail with `message`.
    pub fn failing_anchors(mut self, message: &str) -> Self {
        self.anchor_failure = Some(message.to_string());
        self
    }

    /// Anchors created so far.
    pub fn anchors(&self) -> &[ImageAnchor] {
        &self.anchors
    }

    /// Renders performed so far.
    pub fn renders(&self) -> &[RenderRecord] {
        &self.renders
    }

    /// Names of all objects of a kind, in creation order.
    pub fn objects_of_kind(&self, kind: ObjectKind) -> Vec<String> {
        self.objects
            .iter()
            .filter(|o| o.kind == kind)
            .map(|o| o.name.clone())
            .collect()
    }

    /// Constraints on a pose bone (empty if the bone does not exist).
    pub fn constraints_on(&self, armature: &str, bone: &str) -> Vec<ActionConstraint> {
        self.find_bone(armature, bone)
            .map(|b| b.constraints.clone())
            .unwrap_or_default()
    }

    fn insert_object(&mut self, name: &str, kind: ObjectKind, bones: &[&str]) -> String {
        let name = self.unique_name(name);
        self.objects.push(MemoryObject {
            name: name.clone(),
            kind,
            bones: bones
                .iter()
                .map(|b| MemoryBone {
                    name: (*b).to_string(),
                    constraints: Vec::new(),
                })
                .collect(),
        });
        name
    }

    /// `Name`, then `Name.001`, `Name.002`, ...
    fn unique_name(&self, base: &str) -> String {
        if self.find_object(base).is_none() {
            return base.to_string();
        }
        (1..)
            .map(|i| format!("{}.{:03}", base, i))
            .find(|candidate| self.find_object(candidate).is_none())
            .unwrap_or_else(|| base.to_string())
    }

    fn find_object(&self, name: &str) -> Option<&MemoryObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    fn find_armature(&self, name: &str) -> SceneResult<&MemoryObject> {
        self.find_object(name)
            .filter(|o| o.kind == ObjectKind::Armature)
            .ok_or_else(|| SceneError::ObjectNotFound(name.to_string()))
    }

    fn find_bone(&self, armature: &str, bone: &str) -> Option<&MemoryBone> {
        self.find_object(armature)?
            .bones
            .iter()
            .find(|b| b.name == bone)
    }

    fn find_bone_mut(&mut self, armature: &str, bone: &str) -> SceneResult<&mut MemoryBone> {
        self.objects
            .iter_mut()
            .find(|o| o.name == armature && o.kind == ObjectKind::Armature)
            .ok_or_else(|| SceneError::ObjectNotFound(armature.to_string()))?
            .bones
            .iter_mut()
            .find(|b| b.name == bone)
            .ok_or_else(|| SceneError::BoneNotFound {
                armature: armature.to_string(),
                bone: bone.to_string(),
            })
    }
}

impl SceneObjects for MemoryScene {
    fn active_object(&self) -> Option<SceneObject> {
        let name = self.active.as_deref()?;
        self.object(name)
    }

    fn object(&self, name: &str) -> Option<SceneObject> {
        self.find_object(name)
            .map(|o| SceneObject::new(o.name.clone(), o.kind))
    }
}

impl RenderHost for MemoryScene {
    fn active_camera(&self) -> Option<String> {
        self.camera.clone()
    }

    fn set_active_camera(&mut self, camera: Option<&str>) -> SceneResult<()> {
        if let Some(name) = camera {
            match self.find_object(name) {
                Some(o) if o.kind == ObjectKind::Camera => {}
                _ => return Err(SceneError::ObjectNotFound(name.to_string())),
            }
        }
        self.camera = camera.map(str::to_string);
        Ok(())
    }

    fn add_camera(&mut self, _spec: &CameraSpec) -> SceneResult<String> {
        Ok(self.insert_object("Camera", ObjectKind::Camera, &[]))
    }

    fn remove_object(&mut self, name: &str) -> SceneResult<()> {
        let index = self
            .objects
            .iter()
            .position(|o| o.name == name)
            .ok_or_else(|| SceneError::ObjectNotFound(name.to_string()))?;
        self.objects.remove(index);
        if self.camera.as_deref() == Some(name) {
            self.camera = None;
        }
        if self.active.as_deref() == Some(name) {
            self.active = None;
        }
        Ok(())
    }

    fn current_frame(&self) -> i32 {
        self.frame
    }

    fn set_frame(&mut self, frame: i32) -> SceneResult<()> {
        self.frame = frame;
        Ok(())
    }

    fn render_still(&mut self, path: &Path) -> SceneResult<()> {
        if self.camera.is_none() {
            return Err(SceneError::Render("scene has no camera".to_string()));
        }
        if self.failing_frames.contains(&self.frame) {
            return Err(SceneError::Render(format!(
                "render engine failed on frame {}",
                self.frame
            )));
        }

        let (width, height) = self
            .frame_resolutions
            .get(&self.frame)
            .copied()
            .unwrap_or(self.resolution);
        RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
            .save(path)
            .map_err(|e| SceneError::Render(e.to_string()))?;

        self.renders.push(RenderRecord {
            frame: self.frame,
            camera: self.camera.clone(),
            path: path.to_path_buf(),
        });
        Ok(())
    }
}

impl AnchorHost for MemoryScene {
    fn create_image_anchor(&mut self, anchor: &ImageAnchor) -> SceneResult<String> {
        if let Some(message) = &self.anchor_failure {
            return Err(SceneError::Host(message.clone()));
        }
        let name = self.insert_object(&anchor.name, ObjectKind::Empty, &[]);
        let mut stored = anchor.clone();
        stored.name = name.clone();
        self.anchors.push(stored);
        Ok(name)
    }
}

impl RigScene for MemoryScene {
    fn action(&self, name: &str) -> Option<Action> {
        self.actions.get(name).cloned()
    }

    fn bone_names(&self, armature: &str) -> SceneResult<Vec<String>> {
        Ok(self
            .find_armature(armature)?
            .bones
            .iter()
            .map(|b| b.name.clone())
            .collect())
    }

    fn constraint_names(&self, armature: &str, bone: &str) -> SceneResult<Vec<String>> {
        self.find_armature(armature)?;
        self.find_bone(armature, bone)
            .map(|b| b.constraints.iter().map(|c| c.name.clone()).collect())
            .ok_or_else(|| SceneError::BoneNotFound {
                armature: armature.to_string(),
                bone: bone.to_string(),
            })
    }

    fn constraint(&self, armature: &str, bone: &str, name: &str) -> Option<ActionConstraint> {
        self.find_bone(armature, bone)?
            .constraints
            .iter()
            .find(|c| c.name == name)
            .cloned()
    }

    fn add_constraint(
        &mut self,
        armature: &str,
        bone: &str,
        constraint: ActionConstraint,
    ) -> SceneResult<()> {
        self.find_bone_mut(armature, bone)?
            .constraints
            .push(constraint);
        Ok(())
    }

    fn update_constraint(
        &mut self,
        armature: &str,
        bone: &str,
        constraint: ActionConstraint,
    ) -> SceneResult<()> {
        let bone_name = bone.to_string();
        let slot = self
            .find_bone_mut(armature, bone)?
            .constraints
            .iter_mut()
            .find(|c| c.name == constraint.name)
            .ok_or_else(|| SceneError::ConstraintNotFound {
                bone: bone_name,
                name: constraint.name.clone(),
            })?;
        *slot = constraint;
        Ok(())
    }

    fn remove_constraint(&mut self, armature: &str, bone: &str, name: &str) -> SceneResult<()> {
        let constraints = &mut self.find_bone_mut(armature, bone)?.constraints;
        let before = constraints.len();
        constraints.retain(|c| c.name != name);
        if constraints.len() == before {
            return Err(SceneError::ConstraintNotFound {
                bone: bone.to_string(),
                name: name.to_string(),
            });
        }
        Ok(())
    }
}
