use serde::{Deserialize, Serialize};

use crate::{server::config::ServerConfig, tools::SERVER_NAME};

/// Body of the liveness response served on every unrouted `GET`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub status: String,
}

impl ServerInfo {
    /// Info describing this build of the server.
    pub fn current() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            status: "online".to_string(),
        }
    }
}

/// One-line summary logged once the listener is bound.
pub fn describe_listener(config: &ServerConfig, tool_names: &[&str]) -> String {
    format!(
        "Serving {count} tools on http://{host}:{port} (config {path}): {names}",
        count = tool_names.len(),
        host = config.server.host,
        port = config.server.port,
        path = config.source_path.display(),
        names = tool_names.join(", ")
    )
}
