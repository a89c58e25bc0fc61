//! Where the interpolation runtimes live on disk.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

/// Checkout directory of FILM under the libs folder.
pub const FILM_DIR: &str = "frame-interpolation";

/// Checkout directory of ToonCrafter under the libs folder.
pub const TOONCRAFTER_DIR: &str = "ToonCrafter";

/// Install locations of both backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPaths {
    pub libs_dir: PathBuf,
    pub film_dir: PathBuf,
    pub tooncrafter_dir: PathBuf,
}

impl InstalledPaths {
    pub fn new(libs_dir: &Path) -> Self {
        Self {
            libs_dir: libs_dir.to_path_buf(),
            film_dir: libs_dir.join(FILM_DIR),
            tooncrafter_dir: libs_dir.join(TOONCRAFTER_DIR),
        }
    }

    /// Check if both checkouts are present
    pub fn is_ready(&self) -> bool {
        self.film_dir.is_dir() && self.tooncrafter_dir.is_dir()
    }
}

/// `<data dir>/libs` for this application, e.g.
/// `~/.local/share/smart2d/libs` on Linux.
pub fn default_libs_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "smart2d").map(|dirs| dirs.data_dir().join("libs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installed_paths() {
        let paths = InstalledPaths::new(Path::new("/tmp/libs"));
        assert_eq!(paths.film_dir, PathBuf::from("/tmp/libs/frame-interpolation"));
        assert_eq!(paths.tooncrafter_dir, PathBuf::from("/tmp/libs/ToonCrafter"));
        assert!(!paths.is_ready());
    }

    #[test]
    fn test_ready_when_both_checkouts_exist() {
        let dir = tempfile::tempdir().unwrap();
        let paths = InstalledPaths::new(dir.path());
        std::fs::create_dir_all(&paths.film_dir).unwrap();
        assert!(!paths.is_ready());

        std::fs::create_dir_all(&paths.tooncrafter_dir).unwrap();
        assert!(paths.is_ready());
    }
}
