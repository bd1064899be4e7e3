//! Shared subprocess plumbing for the tool backends.

use std::process::Command;

use log::debug;

use crate::ToolError;

const STDERR_LIMIT: usize = 2000;

#[derive(Debug)]
pub(crate) struct ToolOutput {
    pub stdout: String,
    #[allow(dead_code)]
    pub stderr: String,
}

/// Run a command to completion, capturing both streams. Non-zero exit
/// becomes `ToolError::Failed` with a bounded stderr excerpt.
pub(crate) fn run(tool: &str, cmd: &mut Command) -> Result<ToolOutput, ToolError> {
    debug!("running {tool}: {cmd:?}");
    let output = cmd.output().map_err(|e| ToolError::io(tool, e))?;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(ToolError::Failed {
            tool: tool.to_string(),
            status: output.status.code().unwrap_or(-1),
            stderr: truncate(&stderr),
        });
    }
    Ok(ToolOutput { stdout, stderr })
}

fn truncate(s: &str) -> String {
    if s.len() <= STDERR_LIMIT {
        return s.trim_end().to_string();
    }
    let mut end = STDERR_LIMIT;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_command_captures_stdout() {
        let out = run("echo", Command::new("echo").arg("hello")).unwrap();
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[test]
    fn test_missing_binary_is_io_error() {
        let err = run("nonesuch", &mut Command::new("whittle-no-such-tool")).unwrap_err();
        assert!(matches!(err, ToolError::Io { .. }));
    }

    #[test]
    fn test_nonzero_exit_is_failed() {
        let err = run("false", &mut Command::new("false")).unwrap_err();
        match err {
            ToolError::Failed { tool, status, .. } => {
                assert_eq!(tool, "false");
                assert_ne!(status, 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
