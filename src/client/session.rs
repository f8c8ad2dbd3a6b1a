//! Connectivity state machine: probe, wait for the server, discover.
use std::{fmt, time::Duration};

use tokio::{net::TcpStream, time};
use tracing::{debug, info, warn};

use crate::server::runtime::ToolDescriptor;

use super::{ClientError, ToolClient};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 15;
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(2);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Where the client is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Unprobed,
    Probing,
    Reachable,
    Unreachable,
    Discovering,
    Ready,
    CommandLoop,
    Terminated,
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClientState::Unprobed => "unprobed",
            ClientState::Probing => "probing",
            ClientState::Reachable => "reachable",
            ClientState::Unreachable => "unreachable",
            ClientState::Discovering => "discovering",
            ClientState::Ready => "ready",
            ClientState::CommandLoop => "command_loop",
            ClientState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Fixed-interval retry budget for the startup wait loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

/// Process-local client state.
#[derive(Debug)]
pub struct ClientSession {
    base_url: String,
    connected: bool,
    retry_count: u32,
    state: ClientState,
    policy: RetryPolicy,
}

impl ClientSession {
    pub fn new(base_url: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            base_url: base_url.into(),
            connected: false,
            retry_count: 0,
            state: ClientState::Unprobed,
            policy,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    /// Retries used by the last wait loop (0 when the first probe succeeded).
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    fn transition(&mut self, next: ClientState) {
        debug!(
            target: "crontab_explorer::client",
            from = %self.state,
            to = %next,
            "Client state change"
        );
        self.state = next;
    }

    /// One reachability check: a TCP connect, then `GET /`. Never fails; the
    /// outcome is recorded as `Reachable` or `Unreachable`.
    pub async fn probe(&mut self, api: &ToolClient) -> bool {
        self.transition(ClientState::Probing);
        let reachable = probe_once(api).await;
        self.connected = reachable;
        self.transition(if reachable {
            ClientState::Reachable
        } else {
            ClientState::Unreachable
        });
        reachable
    }

    /// Probe, then re-probe every `interval` until reachable or the budget runs out.
    ///
    /// `on_retry` is called with the attempt number before each retry.
    pub async fn wait_until_reachable(
        &mut self,
        api: &ToolClient,
        mut on_retry: impl FnMut(u32),
    ) -> Result<(), ClientError> {
        self.retry_count = 0;
        if self.probe(api).await {
            return Ok(());
        }
        warn!(
            target: "crontab_explorer::client",
            url = %self.base_url,
            max_attempts = self.policy.max_attempts,
            "Server is not reachable yet; waiting"
        );

        for attempt in 1..=self.policy.max_attempts {
            on_retry(attempt);
            time::sleep(self.policy.interval).await;
            self.retry_count = attempt;
            if self.probe(api).await {
                info!(
                    target: "crontab_explorer::client",
                    url = %self.base_url,
                    attempt,
                    "Server is now reachable"
                );
                return Ok(());
            }
        }

        self.transition(ClientState::Terminated);
        Err(ClientError::ServerUnreachable {
            url: self.base_url.clone(),
            attempts: self.policy.max_attempts,
        })
    }

    /// Fetch the catalog; on success the session is `Ready`.
    pub async fn discover(&mut self, api: &ToolClient) -> Result<Vec<ToolDescriptor>, ClientError> {
        self.transition(ClientState::Discovering);
        match api.discover().await {
            Ok(tools) => {
                info!(
                    target: "crontab_explorer::client",
                    tools = tools.len(),
                    "Discovered tools"
                );
                self.transition(ClientState::Ready);
                Ok(tools)
            }
            Err(err) => {
                self.transition(ClientState::Terminated);
                Err(err)
            }
        }
    }

    pub fn enter_command_loop(&mut self) {
        self.transition(ClientState::CommandLoop);
    }

    pub fn terminate(&mut self) {
        self.connected = false;
        self.transition(ClientState::Terminated);
    }
}

async fn probe_once(api: &ToolClient) -> bool {
    let target = (api.host(), api.port());
    match time::timeout(CONNECT_TIMEOUT, TcpStream::connect(target)).await {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => {
            debug!(target: "crontab_explorer::client", error = %err, "Socket connection failed");
            return false;
        }
        Err(_) => {
            debug!(target: "crontab_explorer::client", "Socket connection timed out");
            return false;
        }
    }

    match api.liveness().await {
        Ok(info) => {
            debug!(
                target: "crontab_explorer::client",
                server = %info.name,
                version = %info.version,
                "Liveness check passed"
            );
            true
        }
        Err(err) => {
            debug!(target: "crontab_explorer::client", error = %err, "Liveness check failed");
            false
        }
    }
}
