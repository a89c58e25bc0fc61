//! Blocking external process execution.

use std::process::Command;

use super::types::{ExternalCommand, InvokeError, InvokeResult, ToolOutput};
use crate::logging::JobLogger;

/// Tail length used when no job logger is attached.
pub const DEFAULT_TAIL: usize = 20;

/// Run `command` to completion, capturing its output.
///
/// A non-zero exit is not an error here; only failing to start is. Output
/// lines replace whatever the logger's tail buffer held before.
pub fn run_tool(
    tool: &str,
    command: &ExternalCommand,
    logger: Option<&JobLogger>,
) -> InvokeResult<ToolOutput> {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args);
    if let Some(cwd) = &command.cwd {
        cmd.current_dir(cwd);
    }

    tracing::debug!("Running: {}", command);
    if let Some(logger) = logger {
        logger.command(&command.to_string());
        logger.clear_tail();
    }

    let output = cmd.output().map_err(|source| InvokeError::Spawn {
        tool: tool.to_string(),
        source,
    })?;

    let result = ToolOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    if let Some(logger) = logger {
        for line in result.stdout.lines() {
            logger.output_line(line, false);
        }
        for line in result.stderr.lines() {
            logger.output_line(line, true);
        }
    }

    tracing::debug!("{} exited with code {}", tool, result.exit_code);
    Ok(result)
}

/// Last `n` lines of `text`, oldest first.
pub fn tail_lines(text: &str, n: usize) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].iter().map(|l| l.to_string()).collect()
}

/// Tail length for error reports: the logger's, or the default.
pub fn tail_len(logger: Option<&JobLogger>) -> usize {
    logger.map_or(DEFAULT_TAIL, JobLogger::tail_capacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_last_lines() {
        let text = "a\nb\nc\nd\n";
        assert_eq!(tail_lines(text, 2), vec!["c", "d"]);
        assert_eq!(tail_lines(text, 10).len(), 4);
        assert!(tail_lines("", 3).is_empty());
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let cmd = ExternalCommand::new("s2d-definitely-not-installed");
        let err = run_tool("fake", &cmd, None).unwrap_err();
        assert!(matches!(err, InvokeError::Spawn { .. }));
        assert_eq!(err.exit_code(), None);
    }

    #[cfg(unix)]
    #[test]
    fn captures_exit_code_and_stderr() {
        let cmd = ExternalCommand::new("sh")
            .arg("-c")
            .arg("echo out; echo oops >&2; exit 3");
        let output = run_tool("sh", &cmd, None).unwrap();
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "oops");
        assert!(!output.success());
    }

    #[cfg(unix)]
    #[test]
    fn runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = ExternalCommand::new("sh")
            .arg("-c")
            .arg("pwd")
            .current_dir(dir.path());
        let output = run_tool("sh", &cmd, None).unwrap();
        let reported = std::path::PathBuf::from(output.stdout.trim());
        assert_eq!(
            reported.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }
}
