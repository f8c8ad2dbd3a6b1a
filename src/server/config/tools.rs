use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::lib::errors::ConfigError;

pub const DEFAULT_CRONTAB_BINARY: &str = "crontab";
pub const DEFAULT_LOG_PATH: &str = "/var/log/syslog";
pub const DEFAULT_LOG_TAIL_LINES: u32 = 10;
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 10;

/// Settings consumed by the host inspection tools.
#[derive(Debug, Clone)]
pub struct ToolsSection {
    pub crontab_binary: String,
    pub log_path: PathBuf,
    pub log_tail_lines: u32,
    pub command_timeout_secs: u64,
}

impl ToolsSection {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            crontab_binary: DEFAULT_CRONTAB_BINARY.to_string(),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            log_tail_lines: DEFAULT_LOG_TAIL_LINES,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawToolsSection {
    pub crontab_binary: Option<String>,
    pub log_path: Option<PathBuf>,
    pub log_tail_lines: Option<u32>,
    pub command_timeout_secs: Option<u64>,
}

pub fn parse_tools_section(
    raw: Option<RawToolsSection>,
    path: &Path,
) -> Result<ToolsSection, ConfigError> {
    let tools_raw = raw.unwrap_or_default();

    let crontab_binary = tools_raw
        .crontab_binary
        .unwrap_or_else(|| DEFAULT_CRONTAB_BINARY.to_string());
    if crontab_binary.trim().is_empty() {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "tools.crontab_binary",
            message: "Provide the crontab executable name or path".into(),
        });
    }

    let log_path = tools_raw
        .log_path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH));
    if log_path.as_os_str().is_empty() || !log_path.is_absolute() {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "tools.log_path",
            message: format!("Only absolute paths are allowed: {}", log_path.display()),
        });
    }

    let log_tail_lines = tools_raw.log_tail_lines.unwrap_or(DEFAULT_LOG_TAIL_LINES);
    if !(1..=1000).contains(&log_tail_lines) {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "tools.log_tail_lines",
            message: "Specify a value between 1 and 1000 lines".into(),
        });
    }

    let command_timeout_secs = tools_raw
        .command_timeout_secs
        .unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECS);
    if !(1..=300).contains(&command_timeout_secs) {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "tools.command_timeout_secs",
            message: "Specify a value between 1 and 300 seconds".into(),
        });
    }

    Ok(ToolsSection {
        crontab_binary,
        log_path,
        log_tail_lines,
        command_timeout_secs,
    })
}
