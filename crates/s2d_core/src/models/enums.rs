//! Core enums used throughout the crate.

use serde::{Deserialize, Serialize};

/// Which external interpolation model a tween job uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// FILM: direct frame interpolation, outputs an mp4.
    #[default]
    Film,
    /// ToonCrafter: generative video diffusion, outputs a gif.
    #[serde(rename = "tooncrafter")]
    ToonCrafter,
}

impl BackendKind {
    /// Get the display name for this backend.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Film => "FILM",
            Self::ToonCrafter => "ToonCrafter",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Kind of a scene object, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Armature,
    /// Paintable drawing object (grease pencil). The only AI tween target.
    GreasePencil,
    Camera,
    Empty,
    Mesh,
    Other,
}

impl ObjectKind {
    /// Whether frames of this object can be rendered for tweening.
    pub fn is_paintable(&self) -> bool {
        matches!(self, ObjectKind::GreasePencil)
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::Armature => write!(f, "armature"),
            ObjectKind::GreasePencil => write!(f, "grease pencil"),
            ObjectKind::Camera => write!(f, "camera"),
            ObjectKind::Empty => write!(f, "empty"),
            ObjectKind::Mesh => write!(f, "mesh"),
            ObjectKind::Other => write!(f, "other"),
        }
    }
}

/// What happens to a job's temporary directory once the job is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TempPolicy {
    /// Delete the directory on the terminal transition.
    #[default]
    Purge,
    /// Leave the directory on disk for inspection.
    Retain,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_serde_names() {
        assert_eq!(
            serde_json::to_string(&BackendKind::ToonCrafter).unwrap(),
            "\"tooncrafter\""
        );
        let parsed: BackendKind = serde_json::from_str("\"film\"").unwrap();
        assert_eq!(parsed, BackendKind::Film);
    }

    #[test]
    fn only_grease_pencil_is_paintable() {
        assert!(ObjectKind::GreasePencil.is_paintable());
        assert!(!ObjectKind::Armature.is_paintable());
        assert!(!ObjectKind::Mesh.is_paintable());
    }
}
