//! CLI argument definitions and `LaunchProfile` construction.
use std::{path::PathBuf, time::Duration};

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};

use crate::{
    client::{ClientOptions, RetryPolicy},
    server::config::{DEFAULT_HOST, DEFAULT_PORT},
};

use super::{build_launch_args, resolve_config_path, LaunchProfile};

/// Parsed command intent from CLI.
#[derive(Debug, Clone)]
pub enum ParsedCommand {
    RunServer(LaunchProfile),
    Client(ClientCommand),
}

/// Client-side actions.
#[derive(Debug, Clone)]
pub enum ClientCommand {
    Interactive(ClientOptions),
    ListTools {
        host: String,
        port: u16,
    },
    Call {
        host: String,
        port: u16,
        tool: String,
        params: Map<String, Value>,
    },
}

/// Top-level optional CLI commands.
#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Connect to a running server and open the interactive menu.
    Client(ClientArgs),
    /// Print the server's tool catalog as JSON.
    Tools(TargetArgs),
    /// Invoke one tool and print the response envelope as JSON.
    Call(CallArgs),
}

/// Server address used by the client commands.
#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

/// Arguments for `client`.
#[derive(Debug, Clone, Args)]
pub struct ClientArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    /// Probe retries while waiting for the server to start.
    #[arg(long, default_value_t = 15)]
    pub max_attempts: u32,
    /// Delay between probe retries, in milliseconds.
    #[arg(long, default_value_t = 2000)]
    pub retry_interval_ms: u64,
}

/// Arguments for `call`.
#[derive(Debug, Clone, Args)]
pub struct CallArgs {
    /// Registered tool name.
    pub tool: String,
    /// Tool parameter as `key=value` (repeatable).
    #[arg(long = "param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
    #[command(flatten)]
    pub target: TargetArgs,
}

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    author,
    version,
    about = "Crontab Explorer: crontab and cron log tools over HTTP",
    long_about = None
)]
pub struct LaunchProfileArgs {
    /// Path to config.toml (overrides CRONTAB_EXPLORER_CONFIG).
    #[arg(long = "config")]
    pub config_override: Option<PathBuf>,
    /// Bind host (overrides the config file).
    #[arg(long = "host")]
    pub host_override: Option<String>,
    /// Bind port (overrides the config file).
    #[arg(long = "port")]
    pub port_override: Option<u16>,
    /// Optional client command mode.
    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

impl LaunchProfileArgs {
    /// Build a `LaunchProfile` from CLI args.
    pub fn build(self) -> Result<LaunchProfile> {
        let config_path = resolve_config_path(self.config_override)?;
        let launch_args = build_launch_args(
            config_path.as_deref(),
            self.host_override.as_deref(),
            self.port_override,
        );

        Ok(LaunchProfile {
            config_path,
            host: self.host_override,
            port: self.port_override,
            launch_args,
        })
    }

    /// Parse CLI args into either server launch mode or a client command.
    pub fn into_command(mut self) -> Result<ParsedCommand> {
        match self.command.take() {
            Some(command) => Ok(ParsedCommand::Client(client_command(command)?)),
            None => Ok(ParsedCommand::RunServer(self.build()?)),
        }
    }
}

fn client_command(command: CliCommand) -> Result<ClientCommand> {
    match command {
        CliCommand::Client(args) => {
            if args.max_attempts == 0 {
                return Err(anyhow!("--max-attempts must be at least 1"));
            }
            Ok(ClientCommand::Interactive(ClientOptions {
                host: args.target.host,
                port: args.target.port,
                retry: RetryPolicy {
                    max_attempts: args.max_attempts,
                    interval: Duration::from_millis(args.retry_interval_ms),
                },
            }))
        }
        CliCommand::Tools(target) => Ok(ClientCommand::ListTools {
            host: target.host,
            port: target.port,
        }),
        CliCommand::Call(args) => {
            let mut params = Map::new();
            for (key, value) in args.params {
                if params.insert(key.clone(), Value::String(value)).is_some() {
                    return Err(anyhow!("parameter `{key}` given more than once"));
                }
            }
            Ok(ClientCommand::Call {
                host: args.target.host,
                port: args.target.port,
                tool: args.tool,
                params,
            })
        }
    }
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    if key.is_empty() {
        return Err(format!("missing parameter name in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}
