use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tracing::info;

use crate::lib::errors::ToolError;

use super::{HostProbe, NoParams, Tool, ToolOutput};

/// `show_scheduled_task_summary`: tail of the cron/system log.
pub struct ShowScheduledTaskSummary {
    host: Arc<dyn HostProbe>,
    log_path: PathBuf,
    lines: u32,
}

impl ShowScheduledTaskSummary {
    pub fn new(host: Arc<dyn HostProbe>, log_path: PathBuf, lines: u32) -> Self {
        Self {
            host,
            log_path,
            lines,
        }
    }
}

#[async_trait]
impl Tool for ShowScheduledTaskSummary {
    type Params = NoParams;

    const NAME: &'static str = "show_scheduled_task_summary";
    const DESCRIPTION: &'static str = "Show most recent related cron log output";

    async fn run(&self, _params: NoParams) -> Result<ToolOutput, ToolError> {
        info!(
            target: "crontab_explorer::tools",
            tool = Self::NAME,
            log_path = %self.log_path.display(),
            lines = self.lines,
            "Tool call"
        );
        let output = self.host.tail_log(&self.log_path, self.lines).await?;
        if !output.success() || output.stdout.is_empty() {
            return Ok(ToolOutput::warning()
                .field("source", self.log_path.to_string_lossy().as_ref())
                .field("message", "No recent cron logs found or error occurred."));
        }

        Ok(ToolOutput::success()
            .with_type("log_entries")
            .field("source", self.log_path.to_string_lossy().as_ref())
            .field("count", output.stdout.lines().count())
            .field("data", output.stdout))
    }
}
