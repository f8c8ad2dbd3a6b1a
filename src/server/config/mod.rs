//! Load and validate server configuration.
use std::{env, path::PathBuf};

use serde::Deserialize;
use tracing::error;

use crate::lib::errors::ConfigError;

pub mod server;
pub mod telemetry;
pub mod tools;

pub use server::{
    parse_server_section, RawServerSection, ServerSection, DEFAULT_HEARTBEAT_SECS, DEFAULT_HOST,
    DEFAULT_PORT, DEFAULT_READ_TIMEOUT_SECS,
};
pub use tools::{
    parse_tools_section, RawToolsSection, ToolsSection, DEFAULT_COMMAND_TIMEOUT_SECS,
    DEFAULT_CRONTAB_BINARY, DEFAULT_LOG_PATH, DEFAULT_LOG_TAIL_LINES,
};

pub(crate) const CONFIG_ENV_KEY: &str = "CRONTAB_EXPLORER_CONFIG";
pub(crate) const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Top-level configuration container.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub tools: ToolsSection,
    pub source_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RawServerConfig {
    server: Option<RawServerSection>,
    tools: Option<RawToolsSection>,
}

impl ServerConfig {
    /// Built-in defaults, attributed to `source_path`.
    pub fn defaults(source_path: PathBuf) -> Self {
        Self {
            server: ServerSection::default(),
            tools: ToolsSection::default(),
            source_path,
        }
    }

    /// Prefer `CRONTAB_EXPLORER_CONFIG` if set; otherwise read `config.toml` when present.
    pub fn load_from_env_or_default() -> Result<Self, ConfigError> {
        match env::var(CONFIG_ENV_KEY) {
            Ok(value) if !value.trim().is_empty() => {
                let path = PathBuf::from(value);
                telemetry::log_env_source(&path, true);
                Self::load_from_path(path)
            }
            _ => {
                let path = PathBuf::from(DEFAULT_CONFIG_PATH);
                telemetry::log_env_source(&path, false);
                Self::load_optional(path)
            }
        }
    }

    /// Load configuration from `path`, falling back to defaults when the file does not exist.
    pub fn load_optional(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            telemetry::log_missing_optional(&path);
            return Ok(Self::defaults(path));
        }
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path. The file must exist.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        tracing::info!(
            target: "crontab_explorer::config",
            path = %path.display(),
            "Starting configuration load"
        );

        let builder = config::Config::builder().add_source(config::File::from(path.clone()));
        let document = builder.build().map_err(|err| {
            let error = ConfigError::from_read_error(path.clone(), err);
            error!(
                target: "crontab_explorer::config",
                path = %path.display(),
                reason = %error,
                "Failed to read configuration file"
            );
            error
        })?;

        let raw: RawServerConfig = document.try_deserialize().map_err(|err| {
            let error = ConfigError::from_parse_error(path.clone(), err);
            error!(
                target: "crontab_explorer::config",
                path = %path.display(),
                reason = %error,
                "Failed to parse configuration file"
            );
            error
        })?;

        let config = Self::from_raw(raw, path.clone()).map_err(|err| {
            error!(
                target: "crontab_explorer::config",
                path = %path.display(),
                reason = %err,
                "Failed to validate configuration file"
            );
            err
        })?;

        telemetry::log_loaded(&config);
        Ok(config)
    }

    /// Apply `--host` / `--port` command-line overrides.
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        port: Option<u16>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = host {
            server::validate_host(&host, &self.source_path)?;
            self.server.host = host;
        }
        if let Some(port) = port {
            server::validate_port(port, &self.source_path)?;
            self.server.port = port;
        }
        Ok(self)
    }

    fn from_raw(raw: RawServerConfig, path: PathBuf) -> Result<Self, ConfigError> {
        let server = parse_server_section(raw.server, &path)?;
        let tools = parse_tools_section(raw.tools, &path)?;

        Ok(Self {
            server,
            tools,
            source_path: path,
        })
    }
}
