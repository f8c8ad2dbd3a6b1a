use std::{path::Path, time::Duration};

use serde::Deserialize;

use crate::lib::errors::ConfigError;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_HEARTBEAT_SECS: u64 = 10;
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 5;

/// Server socket settings.
#[derive(Debug, Clone)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    pub free_port_on_conflict: bool,
    /// `0` disables the heartbeat log.
    pub heartbeat_secs: u64,
    pub read_timeout_secs: u64,
}

impl ServerSection {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            free_port_on_conflict: true,
            heartbeat_secs: DEFAULT_HEARTBEAT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub free_port_on_conflict: Option<bool>,
    pub heartbeat_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
}

pub fn parse_server_section(
    raw: Option<RawServerSection>,
    path: &Path,
) -> Result<ServerSection, ConfigError> {
    let server_raw = raw.unwrap_or_default();
    let host = server_raw.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    validate_host(&host, path)?;
    let port = server_raw.port.unwrap_or(DEFAULT_PORT);
    validate_port(port, path)?;
    let heartbeat_secs = server_raw.heartbeat_secs.unwrap_or(DEFAULT_HEARTBEAT_SECS);
    validate_heartbeat(heartbeat_secs, path)?;
    let read_timeout_secs = server_raw
        .read_timeout_secs
        .unwrap_or(DEFAULT_READ_TIMEOUT_SECS);
    validate_read_timeout(read_timeout_secs, path)?;

    Ok(ServerSection {
        host,
        port,
        free_port_on_conflict: server_raw.free_port_on_conflict.unwrap_or(true),
        heartbeat_secs,
        read_timeout_secs,
    })
}

pub(crate) fn validate_host(host: &str, path: &Path) -> Result<(), ConfigError> {
    if host.trim().is_empty() || host.contains(char::is_whitespace) {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "server.host",
            message: "Provide a host name or IP address without whitespace".into(),
        });
    }
    Ok(())
}

pub(crate) fn validate_port(port: u16, path: &Path) -> Result<(), ConfigError> {
    if (1024..=65535).contains(&port) {
        return Ok(());
    }

    Err(ConfigError::InvalidField {
        path: path.to_path_buf(),
        field: "server.port",
        message: "Use a port in the range 1024-65535".into(),
    })
}

fn validate_heartbeat(secs: u64, path: &Path) -> Result<(), ConfigError> {
    if secs == 0 || (1..=3600).contains(&secs) {
        return Ok(());
    }
    Err(ConfigError::InvalidField {
        path: path.to_path_buf(),
        field: "server.heartbeat_secs",
        message: "Specify 0 to disable or a value between 1 and 3600 seconds".into(),
    })
}

fn validate_read_timeout(secs: u64, path: &Path) -> Result<(), ConfigError> {
    if !(1..=300).contains(&secs) {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "server.read_timeout_secs",
            message: "Specify a value between 1 and 300 seconds".into(),
        });
    }
    Ok(())
}
