//! Telemetry initialization and tool invocation span helpers.

use std::time::Instant;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, info_span, Span};
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

/// Initialize `tracing` and format developer logs.
pub fn init_tracing() -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}

/// Span helper to record start and finish of a single tool invocation.
pub struct InvocationSpan {
    span: Span,
    started_at: Instant,
    request_id: Uuid,
    tool: String,
}

impl InvocationSpan {
    /// Start an invocation span with a fresh request id.
    pub fn start(tool: &str) -> Self {
        let request_id = Uuid::new_v4();
        let span = info_span!(
            target: "crontab_explorer::dispatch",
            "tool_invocation",
            %request_id,
            tool
        );
        Self {
            span,
            started_at: Instant::now(),
            request_id,
            tool: tool.to_string(),
        }
    }

    /// The span to instrument the invocation future with.
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Close the span while recording the envelope status.
    pub fn finish(self, status: &str) {
        let elapsed_ms = self.started_at.elapsed().as_millis();
        let _entered = self.span.enter();
        info!(
            target: "crontab_explorer::dispatch",
            request_id = %self.request_id,
            tool = %self.tool,
            status = status,
            elapsed_ms = elapsed_ms,
            "Completed tool invocation"
        );
    }
}

/// Payload for logging server runtime state as structured telemetry.
#[derive(Debug, Serialize)]
pub struct RuntimeModeTelemetry<'a> {
    pub host: &'a str,
    pub port: u16,
    pub config_path: &'a str,
    pub tools_registered: usize,
    pub heartbeat_secs: u64,
    pub launch_args: &'a [String],
}

/// Emit runtime mode to `tracing`.
pub fn emit_runtime_mode(telemetry: &RuntimeModeTelemetry<'_>) {
    info!(
        target: "crontab_explorer::runtime",
        host = telemetry.host,
        port = telemetry.port,
        config_path = telemetry.config_path,
        tools_registered = telemetry.tools_registered,
        heartbeat_secs = telemetry.heartbeat_secs,
        launch_args = ?telemetry.launch_args,
        pid = std::process::id(),
        "Starting tool server"
    );
}
