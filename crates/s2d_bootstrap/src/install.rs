//! Fire-and-forget dependency installer.
//!
//! Every step is an external command run with `tokio::process`. The first
//! failing step ends the install; nothing is rolled back.

use std::path::PathBuf;

use anyhow::Context as _;
use thiserror::Error;
use tokio::process::Command;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::paths::{InstalledPaths, FILM_DIR, TOONCRAFTER_DIR};

/// Packages shared by both backends.
pub const DEFAULT_PACKAGES: &[&str] = &[
    "tensorflow",
    "torch",
    "diffusers",
    "transformers",
    "accelerate",
    "mediapy",
    "numpy",
    "scikit-image",
    "pyyaml",
    "natsort",
];

const STDERR_TAIL: usize = 20;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} exited with code {exit_code}: {stderr}")]
    Failed {
        program: String,
        exit_code: i32,
        stderr: String,
    },
}

/// A git repository to clone into the libs folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSpec {
    /// Display name.
    pub name: String,
    pub url: String,
    /// Directory name under the libs folder.
    pub dir: String,
}

impl RepoSpec {
    pub fn new(name: &str, url: &str, dir: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            dir: dir.to_string(),
        }
    }
}

/// One step of an install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCommand {
    /// Shown in `InstallStatus::Running`.
    pub label: String,
    pub program: String,
    pub args: Vec<String>,
    /// The step is skipped when this path already exists.
    pub skip_if_exists: Option<PathBuf>,
}

impl InstallCommand {
    fn new(label: impl Into<String>, program: &str, args: &[&str]) -> Self {
        Self {
            label: label.into(),
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            skip_if_exists: None,
        }
    }

    fn unless_exists(mut self, path: PathBuf) -> Self {
        self.skip_if_exists = Some(path);
        self
    }
}

/// What to install and where.
#[derive(Debug, Clone)]
pub struct InstallPlan {
    /// Interpreter the backends will run with.
    pub python: String,
    pub git: String,
    pub libs_dir: PathBuf,
    pub packages: Vec<String>,
    pub repos: Vec<RepoSpec>,
}

impl InstallPlan {
    /// Default packages plus FILM and ToonCrafter.
    pub fn new(python: impl Into<String>, libs_dir: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
            git: "git".to_string(),
            libs_dir: libs_dir.into(),
            packages: DEFAULT_PACKAGES.iter().map(|p| p.to_string()).collect(),
            repos: vec![
                RepoSpec::new(
                    "FILM",
                    "https://github.com/google-research/frame-interpolation",
                    FILM_DIR,
                ),
                RepoSpec::new(
                    "ToonCrafter",
                    "https://github.com/Doubiiu/ToonCrafter",
                    TOONCRAFTER_DIR,
                ),
            ],
        }
    }

    pub fn with_git(mut self, git: impl Into<String>) -> Self {
        self.git = git.into();
        self
    }

    pub fn with_packages(mut self, packages: Vec<String>) -> Self {
        self.packages = packages;
        self
    }

    pub fn paths(&self) -> InstalledPaths {
        InstalledPaths::new(&self.libs_dir)
    }

    /// The commands this plan runs, in order.
    pub fn commands(&self) -> Vec<InstallCommand> {
        let python = self.python.as_str();
        let mut commands = vec![
            InstallCommand::new("Ensuring pip", python, &["-m", "ensurepip", "--upgrade"]),
            InstallCommand::new(
                "Upgrading pip",
                python,
                &["-m", "pip", "install", "--upgrade", "pip"],
            ),
        ];

        if !self.packages.is_empty() {
            let mut args = vec!["-m", "pip", "install"];
            args.extend(self.packages.iter().map(String::as_str));
            commands.push(InstallCommand::new("Installing packages", python, &args));
        }

        for repo in &self.repos {
            let dir = self.libs_dir.join(&repo.dir);
            let dir_arg = dir.to_string_lossy();
            commands.push(
                InstallCommand::new(
                    format!("Cloning {}", repo.name),
                    &self.git,
                    &["clone", repo.url.as_str(), &*dir_arg],
                )
                .unless_exists(dir.clone()),
            );
            let requirements = dir.join("requirements.txt");
            let requirements_arg = requirements.to_string_lossy();
            commands.push(InstallCommand::new(
                format!("Installing {} requirements", repo.name),
                python,
                &["-m", "pip", "install", "-r", &*requirements_arg],
            ));
        }

        commands
    }
}

/// Progress of a background install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallStatus {
    Pending,
    /// Label of the step being run.
    Running(String),
    Ready(InstalledPaths),
    Failed(String),
}

impl InstallStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, InstallStatus::Ready(_) | InstallStatus::Failed(_))
    }
}

/// Handle to a running install.
///
/// Dropping the handle does not stop the install.
pub struct InstallHandle {
    status: watch::Receiver<InstallStatus>,
    task: JoinHandle<()>,
}

impl InstallHandle {
    /// Latest status.
    pub fn status(&self) -> InstallStatus {
        self.status.borrow().clone()
    }

    /// A receiver for watching status changes.
    pub fn subscribe(&self) -> watch::Receiver<InstallStatus> {
        self.status.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the install to end and return its final status.
    pub async fn wait(self) -> InstallStatus {
        if let Err(e) = self.task.await {
            warn!("Install task ended abnormally: {}", e);
            return InstallStatus::Failed(e.to_string());
        }
        self.status.borrow().clone()
    }
}

/// Start `plan` on the current tokio runtime and return immediately.
///
/// Must be called from within a runtime.
pub fn spawn_install(plan: InstallPlan) -> InstallHandle {
    spawn_install_on(&Handle::current(), plan)
}

/// Start `plan` on `runtime` and return immediately.
pub fn spawn_install_on(runtime: &Handle, plan: InstallPlan) -> InstallHandle {
    let (tx, rx) = watch::channel(InstallStatus::Pending);
    let task = runtime.spawn(async move {
        let status = match run_plan(&plan, &tx).await {
            Ok(paths) => {
                info!("Interpolation runtimes ready in {}", paths.libs_dir.display());
                InstallStatus::Ready(paths)
            }
            Err(e) => {
                warn!("Install failed: {:#}", e);
                InstallStatus::Failed(format!("{:#}", e))
            }
        };
        tx.send_replace(status);
    });
    InstallHandle { status: rx, task }
}

async fn run_plan(
    plan: &InstallPlan,
    tx: &watch::Sender<InstallStatus>,
) -> anyhow::Result<InstalledPaths> {
    tokio::fs::create_dir_all(&plan.libs_dir)
        .await
        .map_err(|source| InstallError::CreateDir {
            path: plan.libs_dir.clone(),
            source,
        })?;

    for command in plan.commands() {
        if let Some(path) = &command.skip_if_exists {
            if path.exists() {
                debug!("{}: {} exists, skipping", command.label, path.display());
                continue;
            }
        }
        info!("{}", command.label);
        tx.send_replace(InstallStatus::Running(command.label.clone()));
        run_command(&command)
            .await
            .with_context(|| format!("{} failed", command.label))?;
    }

    Ok(plan.paths())
}

async fn run_command(command: &InstallCommand) -> Result<(), InstallError> {
    debug!("Running: {} {}", command.program, command.args.join(" "));
    let output = Command::new(&command.program)
        .args(&command.args)
        .output()
        .await
        .map_err(|source| InstallError::Spawn {
            program: command.program.clone(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let lines: Vec<&str> = stderr.lines().collect();
        let tail = lines[lines.len().saturating_sub(STDERR_TAIL)..].join("\n");
        return Err(InstallError::Failed {
            program: command.program.clone(),
            exit_code: output.status.code().unwrap_or(-1),
            stderr: tail,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_runs_pip_then_packages_then_repos() {
        let plan = InstallPlan::new("python3", "/opt/libs");
        let labels: Vec<String> = plan.commands().into_iter().map(|c| c.label).collect();
        assert_eq!(
            labels,
            vec![
                "Ensuring pip",
                "Upgrading pip",
                "Installing packages",
                "Cloning FILM",
                "Installing FILM requirements",
                "Cloning ToonCrafter",
                "Installing ToonCrafter requirements",
            ]
        );
    }

    #[test]
    fn clone_targets_libs_dir_and_is_skippable() {
        let plan = InstallPlan::new("python3", "/opt/libs");
        let commands = plan.commands();
        let clone = &commands[3];
        assert_eq!(clone.program, "git");
        assert_eq!(
            clone.args,
            vec![
                "clone",
                "https://github.com/google-research/frame-interpolation",
                "/opt/libs/frame-interpolation",
            ]
        );
        assert_eq!(
            clone.skip_if_exists,
            Some(PathBuf::from("/opt/libs/frame-interpolation"))
        );
        assert_eq!(
            commands[4].args.last().map(String::as_str),
            Some("/opt/libs/frame-interpolation/requirements.txt")
        );
    }

    #[test]
    fn empty_package_list_skips_package_step() {
        let plan = InstallPlan::new("python3", "/opt/libs").with_packages(Vec::new());
        assert!(plan
            .commands()
            .iter()
            .all(|c| c.label != "Installing packages"));
    }

    #[tokio::test]
    async fn failing_pip_reports_failed_status() {
        let dir = tempfile::tempdir().unwrap();
        let handle = spawn_install(InstallPlan::new("false", dir.path()));

        match handle.wait().await {
            InstallStatus::Failed(message) => assert!(message.contains("Ensuring pip")),
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[tokio::test]
    async fn existing_checkouts_are_not_cloned() {
        let dir = tempfile::tempdir().unwrap();
        let paths = InstalledPaths::new(dir.path());
        std::fs::create_dir_all(&paths.film_dir).unwrap();
        std::fs::create_dir_all(&paths.tooncrafter_dir).unwrap();

        let plan = InstallPlan::new("true", dir.path()).with_git("/nonexistent/git");
        let status = spawn_install(plan).wait().await;

        assert_eq!(status, InstallStatus::Ready(paths.clone()));
        assert!(paths.is_ready());
    }

    #[tokio::test]
    async fn missing_git_fails_at_clone() {
        let dir = tempfile::tempdir().unwrap();
        let plan = InstallPlan::new("true", dir.path()).with_git("/nonexistent/git");

        let handle = spawn_install(plan);
        let mut watcher = handle.subscribe();
        let status = handle.wait().await;

        match status {
            InstallStatus::Failed(message) => {
                assert!(message.contains("Cloning FILM"));
                assert!(message.contains("/nonexistent/git"));
            }
            other => panic!("unexpected status {other:?}"),
        }
        assert!(watcher.borrow_and_update().is_finished());
    }
}
