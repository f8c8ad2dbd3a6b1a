//! CLI entrypoint module structure.
use anyhow::{Context, Result};

use crate::client::{self, ClientError, ConsolePrompter, ToolClient};

pub mod args;
pub mod profile;

pub use args::{
    CallArgs, CliCommand, ClientArgs, ClientCommand, LaunchProfileArgs, ParsedCommand, TargetArgs,
};
pub use profile::{build_launch_args, resolve_config_path, LaunchProfile};

/// Execute a client command. Returns the payload to print, if any.
pub async fn execute_client_command(command: ClientCommand) -> Result<Option<String>> {
    match command {
        ClientCommand::Interactive(options) => {
            let mut prompter = ConsolePrompter::new();
            client::run_interactive(&options, &mut prompter).await?;
            Ok(None)
        }
        ClientCommand::ListTools { host, port } => {
            let tools = ToolClient::new(&host, port)?.discover().await?;
            Ok(Some(
                serde_json::to_string_pretty(&tools).context("failed to format tool catalog")?,
            ))
        }
        ClientCommand::Call {
            host,
            port,
            tool,
            params,
        } => {
            let output = ToolClient::new(&host, port)?
                .invoke(&tool, &params)
                .await
                .map_err(|err: ClientError| {
                    anyhow::Error::new(err).context(format!("calling `{tool}` failed"))
                })?;
            Ok(Some(
                serde_json::to_string_pretty(&output).context("failed to format response")?,
            ))
        }
    }
}
