//! Background installer for the frame interpolation runtimes.
//!
//! This crate handles:
//! 1. Making sure pip is available and current
//! 2. Installing the Python packages both backends need
//! 3. Cloning FILM and ToonCrafter and installing their requirements
//!
//! The install runs on a tokio task and reports through a `watch` channel,
//! so a host can keep working while it runs:
//!
//! ```ignore
//! let plan = InstallPlan::new("python3", default_libs_dir()?);
//! let handle = spawn_install(plan);
//! // later
//! if let InstallStatus::Ready(paths) = handle.status() {
//!     settings.tween.film_path = paths.film_dir.display().to_string();
//! }
//! ```

mod install;
mod paths;

pub use install::{
    spawn_install, spawn_install_on, InstallCommand, InstallError, InstallHandle, InstallPlan,
    InstallStatus, RepoSpec, DEFAULT_PACKAGES,
};
pub use paths::{default_libs_dir, InstalledPaths, FILM_DIR, TOONCRAFTER_DIR};
