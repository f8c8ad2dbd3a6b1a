use std::{path::Path, time::Duration};

use async_trait::async_trait;

use crate::lib::{
    errors::ShellError,
    shell::{run_command, CommandOutput},
};

/// Abstraction for host access performed by the tools.
#[async_trait]
pub trait HostProbe: Send + Sync {
    /// Current user's crontab (`crontab -l`).
    async fn crontab_listing(&self) -> Result<CommandOutput, ShellError>;
    /// Last `lines` lines of the log file at `path`.
    async fn tail_log(&self, path: &Path, lines: u32) -> Result<CommandOutput, ShellError>;
}

/// Probe that operates against the real host.
#[derive(Debug, Clone)]
pub struct SystemHostProbe {
    crontab_binary: String,
    timeout: Duration,
}

impl SystemHostProbe {
    pub fn new(crontab_binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            crontab_binary: crontab_binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl HostProbe for SystemHostProbe {
    async fn crontab_listing(&self) -> Result<CommandOutput, ShellError> {
        run_command(&self.crontab_binary, &["-l"], self.timeout).await
    }

    async fn tail_log(&self, path: &Path, lines: u32) -> Result<CommandOutput, ShellError> {
        let count = lines.to_string();
        let path = path.to_string_lossy();
        run_command("tail", &["-n", &count, "--", &path], self.timeout).await
    }
}
