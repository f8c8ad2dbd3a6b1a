//! Entry point for Crontab Explorer.
use std::process::ExitCode;

use anyhow::Error;
use clap::Parser;
use crontab_explorer::{
    cli::{execute_client_command, ClientCommand, LaunchProfile, LaunchProfileArgs, ParsedCommand},
    lib::telemetry,
    server::runtime::{self, RuntimeExit},
};

#[tokio::main]
async fn main() -> ExitCode {
    match bootstrap().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(exit) => exit.report(),
    }
}

async fn bootstrap() -> Result<(), RuntimeExit> {
    telemetry::init_tracing().map_err(RuntimeExit::from_error)?;
    let args = LaunchProfileArgs::parse();
    let command = args.into_command().map_err(RuntimeExit::from_error)?;

    match command {
        ParsedCommand::RunServer(profile) => run_server(profile).await,
        ParsedCommand::Client(command) => handle_client_command(command).await,
    }
}

async fn run_server(profile: LaunchProfile) -> Result<(), RuntimeExit> {
    let config = profile
        .load_config()
        .map_err(|err| RuntimeExit::from_error(Error::new(err)))?;
    runtime::run_server(profile, config).await
}

async fn handle_client_command(command: ClientCommand) -> Result<(), RuntimeExit> {
    if let Some(payload) = execute_client_command(command)
        .await
        .map_err(RuntimeExit::from_error)?
    {
        println!("{payload}");
    }
    Ok(())
}
