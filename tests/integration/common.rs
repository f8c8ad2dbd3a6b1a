use std::{
    io,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use crontab_explorer::{
    lib::{errors::ShellError, shell::CommandOutput},
    server::{
        config::ServerConfig,
        runtime::{build_context, serve, ServerContext, ToolRegistry},
    },
    tools::HostProbe,
};
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;

pub const BINARY_PATH: &str = env!("CARGO_BIN_EXE_crontab-explorer");

pub const SAMPLE_CRONTAB: &str = "# m h dom mon dow command\n\
0 3 * * * /usr/local/bin/rotate-logs\n\
*/10 * * * * /usr/bin/sync-mail\n";

/// Host with a canned crontab and cron log.
#[derive(Debug, Clone)]
pub struct CannedHost {
    pub crontab: String,
    pub log: String,
}

impl CannedHost {
    pub fn sample() -> Self {
        Self {
            crontab: SAMPLE_CRONTAB.to_string(),
            log: "Oct 19 03:00:01 host CRON[4242]: (root) CMD (/usr/local/bin/rotate-logs)\n"
                .to_string(),
        }
    }
}

#[async_trait]
impl HostProbe for CannedHost {
    async fn crontab_listing(&self) -> Result<CommandOutput, ShellError> {
        Ok(CommandOutput {
            exit_code: Some(0),
            stdout: self.crontab.clone(),
            stderr: String::new(),
        })
    }

    async fn tail_log(&self, _path: &Path, _lines: u32) -> Result<CommandOutput, ShellError> {
        Ok(CommandOutput {
            exit_code: Some(0),
            stdout: self.log.clone(),
            stderr: String::new(),
        })
    }
}

/// Server running on an ephemeral loopback port inside the test process.
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    handle: JoinHandle<io::Result<()>>,
}

impl TestServer {
    pub async fn start(registry: ToolRegistry) -> Result<Self> {
        Self::start_with(ServerContext::new(registry, Duration::from_secs(2))).await
    }

    /// All built-in tools backed by `host`.
    pub async fn start_builtin(host: CannedHost) -> Result<Self> {
        let config = ServerConfig::defaults(PathBuf::from("config.toml"));
        let ctx = build_context(&config, Arc::new(host)).context("builtin tools register")?;
        Self::start_with(ctx).await
    }

    async fn start_with(ctx: ServerContext) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind test listener")?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(serve(listener, Arc::new(ctx), shutdown.clone()));
        Ok(Self {
            addr,
            shutdown,
            handle,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub async fn stop(self) -> Result<()> {
        self.shutdown.cancel();
        self.handle.await??;
        Ok(())
    }
}

/// A loopback port with nothing listening on it.
pub async fn closed_port() -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    Ok(listener.local_addr()?.port())
}

pub fn http() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("reqwest client builds")
}

pub fn fixture(relative: &str) -> String {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    root.join(relative).display().to_string()
}
