use std::{process::ExitCode, sync::Arc, time::Duration};

use anyhow::{Context, Error};
use tokio::{
    net::{TcpListener, TcpStream},
    task::JoinHandle,
    time,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    cli::LaunchProfile,
    lib::{
        errors::RegistryError,
        shell::run_command,
        telemetry::{emit_runtime_mode, RuntimeModeTelemetry},
    },
    server::{
        config::{ServerConfig, ServerSection},
        runtime::{describe_listener, http, ServerContext, ToolRegistry},
    },
    tools::{register_builtin_tools, HostProbe, SystemHostProbe},
};

const PORT_PROBE_TIMEOUT: Duration = Duration::from_millis(500);
const FUSER_TIMEOUT: Duration = Duration::from_secs(5);
const PORT_RELEASE_GRACE: Duration = Duration::from_secs(1);

/// Bundles a runtime error message with an exit code.
#[derive(Debug)]
pub struct RuntimeExit {
    message: String,
    exit_code: ExitCode,
}

impl RuntimeExit {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    pub fn from_error(err: impl Into<Error>) -> Self {
        let err = err.into();
        Self {
            message: format!("{err:?}"),
            exit_code: ExitCode::FAILURE,
        }
    }

    pub fn report(self) -> ExitCode {
        eprintln!("{}", self.message);
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }
}

/// Register the built-in tools against `host` and freeze them into a server context.
pub fn build_context(
    config: &ServerConfig,
    host: Arc<dyn HostProbe>,
) -> Result<ServerContext, RegistryError> {
    let mut registry = ToolRegistry::new();
    register_builtin_tools(&mut registry, host, &config.tools)?;
    Ok(ServerContext::new(registry, config.server.read_timeout()))
}

/// Start the tool server and serve until Ctrl-C.
pub async fn run_server(profile: LaunchProfile, config: ServerConfig) -> Result<(), RuntimeExit> {
    let host = Arc::new(SystemHostProbe::new(
        config.tools.crontab_binary.clone(),
        config.tools.command_timeout(),
    ));
    let ctx = Arc::new(build_context(&config, host).map_err(RuntimeExit::from_error)?);

    emit_runtime_mode(&RuntimeModeTelemetry {
        host: config.server.host.as_str(),
        port: config.server.port,
        config_path: config.source_path.to_string_lossy().as_ref(),
        tools_registered: ctx.registry().len(),
        heartbeat_secs: config.server.heartbeat_secs,
        launch_args: &profile.launch_args,
    });

    reclaim_port(&config.server).await;

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind TCP port {addr}"))
        .map_err(RuntimeExit::from_error)?;
    info!(
        target: "crontab_explorer::runtime",
        bind_addr = %addr,
        "{}",
        describe_listener(&config, &ctx.registry().names())
    );

    let shutdown = CancellationToken::new();
    let heartbeat = spawn_heartbeat(config.server.heartbeat_secs, shutdown.clone());
    spawn_ctrl_c_watcher(shutdown.clone());

    let served = http::serve(listener, ctx, shutdown.clone()).await;
    shutdown.cancel();
    if let Some(handle) = heartbeat {
        let _ = handle.await;
    }
    info!(target: "crontab_explorer::runtime", "Server stopped");

    served
        .with_context(|| format!("server on {addr} stopped unexpectedly"))
        .map_err(RuntimeExit::from_error)
}

/// Whether something already accepts connections on the configured port.
pub async fn port_in_use(server: &ServerSection) -> bool {
    let target = (probe_host(&server.host), server.port);
    matches!(
        time::timeout(PORT_PROBE_TIMEOUT, TcpStream::connect(target)).await,
        Ok(Ok(_))
    )
}

/// Wildcard bind addresses are probed through loopback.
fn probe_host(host: &str) -> &str {
    match host {
        "0.0.0.0" | "::" | "[::]" => "127.0.0.1",
        other => other,
    }
}

/// Warn about an occupied port and, when allowed, try to free it.
async fn reclaim_port(server: &ServerSection) {
    if !port_in_use(server).await {
        return;
    }
    warn!(
        target: "crontab_explorer::runtime",
        port = server.port,
        "Port is already in use"
    );
    if !server.free_port_on_conflict {
        return;
    }
    if !cfg!(target_os = "linux") {
        warn!(
            target: "crontab_explorer::runtime",
            port = server.port,
            "Freeing an occupied port is only supported on Linux"
        );
        return;
    }

    let target = format!("{}/tcp", server.port);
    match run_command("fuser", &["-k", &target], FUSER_TIMEOUT).await {
        Ok(output) if output.success() => {
            info!(
                target: "crontab_explorer::runtime",
                port = server.port,
                "Released occupied port"
            );
            time::sleep(PORT_RELEASE_GRACE).await;
        }
        Ok(output) => warn!(
            target: "crontab_explorer::runtime",
            port = server.port,
            exit_code = ?output.exit_code,
            stderr = %output.stderr.trim(),
            "fuser could not release the port"
        ),
        Err(err) => warn!(
            target: "crontab_explorer::runtime",
            port = server.port,
            error = %err,
            "Failed to run fuser"
        ),
    }
}

fn spawn_heartbeat(interval_secs: u64, shutdown: CancellationToken) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        return None;
    }
    Some(tokio::spawn(async move {
        let mut ticker = time::interval(Duration::from_secs(interval_secs));
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    info!(target: "crontab_explorer::runtime", "Server running");
                }
            }
        }
    }))
}

fn spawn_ctrl_c_watcher(shutdown: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!(target: "crontab_explorer::runtime", "Shutting down on Ctrl-C");
                shutdown.cancel();
            }
            Err(err) => warn!(
                target: "crontab_explorer::runtime",
                error = %err,
                "Failed to listen for Ctrl-C"
            ),
        }
    });
}
