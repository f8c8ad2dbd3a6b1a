use async_trait::async_trait;

use crate::lib::errors::ToolError;

use super::{NoParams, Tool, ToolOutput};

/// Name reported by the liveness endpoint and `check_server_status`.
pub const SERVER_NAME: &str = "MCP Crontab Explorer Server";

/// `check_server_status`
pub struct CheckServerStatus {
    tools_available: usize,
}

impl CheckServerStatus {
    pub fn new(tools_available: usize) -> Self {
        Self { tools_available }
    }
}

#[async_trait]
impl Tool for CheckServerStatus {
    type Params = NoParams;

    const NAME: &'static str = "check_server_status";
    const DESCRIPTION: &'static str = "Check the status of the MCP server";

    async fn run(&self, _params: NoParams) -> Result<ToolOutput, ToolError> {
        tracing::info!(target: "crontab_explorer::tools", tool = Self::NAME, "Tool call");
        Ok(ToolOutput::online()
            .field("server_name", SERVER_NAME)
            .field("version", env!("CARGO_PKG_VERSION"))
            .field("tools_available", self.tools_available)
            .field("pid", std::process::id()))
    }
}
