//! LaunchProfile and config resolution.
use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::{lib::errors::ConfigError, server::config::ServerConfig};

/// Resolved server launch profile.
#[derive(Debug, Clone)]
pub struct LaunchProfile {
    /// Explicit `--config` path; `None` defers to the env var / default file.
    pub config_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub launch_args: Vec<String>,
}

impl LaunchProfile {
    /// Load the configuration this profile points at and apply `--host` / `--port`.
    ///
    /// An explicit `--config` file must exist; otherwise `CRONTAB_EXPLORER_CONFIG`
    /// or an optional `config.toml` is used.
    pub fn load_config(&self) -> Result<ServerConfig, ConfigError> {
        let config = match &self.config_path {
            Some(path) => ServerConfig::load_from_path(path.clone())?,
            None => ServerConfig::load_from_env_or_default()?,
        };
        config.with_overrides(self.host.clone(), self.port)
    }
}

/// Make an explicit config path absolute against the working directory.
pub fn resolve_config_path(override_path: Option<PathBuf>) -> Result<Option<PathBuf>> {
    let Some(path) = override_path else {
        return Ok(None);
    };
    if path.is_absolute() {
        return Ok(Some(path));
    }

    let cwd = env::current_dir().context("failed to obtain current directory")?;
    Ok(Some(cwd.join(path)))
}

/// Build launch arguments suitable for reproduction/logging.
pub fn build_launch_args(config: Option<&Path>, host: Option<&str>, port: Option<u16>) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(config) = config {
        args.push(format!("--config={}", config.display()));
    }
    if let Some(host) = host {
        args.push(format!("--host={host}"));
    }
    if let Some(port) = port {
        args.push(format!("--port={port}"));
    }
    args
}
