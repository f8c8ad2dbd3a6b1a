//! Host command runner used by the tool handlers.

use std::{process::Stdio, time::Duration};

use tokio::{process::Command, time};
use tracing::debug;

use super::errors::ShellError;

/// Captured result of a finished host command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout lines, skipping a trailing empty line.
    pub fn stdout_lines(&self) -> Vec<String> {
        self.stdout.lines().map(str::to_string).collect()
    }
}

/// Run `program` with `args` directly (no shell) and capture its output.
pub async fn run_command(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<CommandOutput, ShellError> {
    let mut command = Command::new(program);
    command
        .args(args)
        .kill_on_drop(true)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!(
        target: "crontab_explorer::tools",
        program,
        args = ?args,
        timeout_secs = timeout.as_secs(),
        "Running host command"
    );

    let output = time::timeout(timeout, command.output())
        .await
        .map_err(|_| ShellError::Timeout {
            program: program.to_string(),
            duration_secs: timeout.as_secs(),
        })?
        .map_err(|source| ShellError::Spawn {
            program: program.to_string(),
            source,
        })?;

    Ok(CommandOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
