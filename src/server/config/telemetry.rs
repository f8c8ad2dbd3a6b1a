use tracing::{debug, info};

use super::{ServerConfig, CONFIG_ENV_KEY, DEFAULT_CONFIG_PATH};

pub fn log_env_source(path: &std::path::Path, from_env: bool) {
    if from_env {
        info!(
            target: "crontab_explorer::config",
            path = %path.display(),
            "Loading configuration using CRONTAB_EXPLORER_CONFIG environment variable"
        );
    } else {
        debug!(
            target: "crontab_explorer::config",
            path = %path.display(),
            env = CONFIG_ENV_KEY,
            default = DEFAULT_CONFIG_PATH,
            "CRONTAB_EXPLORER_CONFIG not set; using default config.toml"
        );
    }
}

pub fn log_missing_optional(path: &std::path::Path) {
    info!(
        target: "crontab_explorer::config",
        path = %path.display(),
        "Configuration file not found; using built-in defaults"
    );
}

pub fn log_loaded(config: &ServerConfig) {
    info!(
        target: "crontab_explorer::config",
        path = %config.source_path.display(),
        host = %config.server.host,
        port = config.server.port,
        free_port_on_conflict = config.server.free_port_on_conflict,
        heartbeat_secs = config.server.heartbeat_secs,
        crontab_binary = %config.tools.crontab_binary,
        log_path = %config.tools.log_path.display(),
        log_tail_lines = config.tools.log_tail_lines,
        command_timeout_secs = config.tools.command_timeout_secs,
        "Configuration loaded successfully"
    );
}
