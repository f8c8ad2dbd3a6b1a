//! Crontab inspection tools.
use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

use crate::lib::{errors::ToolError, shell::CommandOutput};

use super::{HostProbe, NoParams, Tool, ToolOutput};

/// Non-empty crontab lines, or `None` when the listing failed or is empty.
fn listed_entries(output: &CommandOutput) -> Option<Vec<String>> {
    if !output.success() || output.stdout.trim().is_empty() {
        return None;
    }
    Some(output.stdout_lines())
}

fn log_call(tool: &str) {
    info!(target: "crontab_explorer::tools", tool, "Tool call");
}

/// `fetch_crontab_entries`
pub struct FetchCrontabEntries {
    host: Arc<dyn HostProbe>,
}

impl FetchCrontabEntries {
    pub fn new(host: Arc<dyn HostProbe>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl Tool for FetchCrontabEntries {
    type Params = NoParams;

    const NAME: &'static str = "fetch_crontab_entries";
    const DESCRIPTION: &'static str = "Fetch cron jobs for the app";

    async fn run(&self, _params: NoParams) -> Result<ToolOutput, ToolError> {
        log_call(Self::NAME);
        let listing = self.host.crontab_listing().await?;
        Ok(match listed_entries(&listing) {
            Some(entries) => ToolOutput::success()
                .with_type("crontab_entries")
                .field("count", entries.len())
                .field("entries", entries)
                .field("raw_data", listing.stdout),
            None => ToolOutput::warning()
                .with_type("crontab_entries")
                .field("count", 0)
                .field("message", "No crontab entries found or error occurred."),
        })
    }
}

/// `count_crontab_entries`
pub struct CountCrontabEntries {
    host: Arc<dyn HostProbe>,
}

impl CountCrontabEntries {
    pub fn new(host: Arc<dyn HostProbe>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl Tool for CountCrontabEntries {
    type Params = NoParams;

    const NAME: &'static str = "count_crontab_entries";
    const DESCRIPTION: &'static str = "Fetch the count of cron jobs for the app";

    async fn run(&self, _params: NoParams) -> Result<ToolOutput, ToolError> {
        log_call(Self::NAME);
        let listing = self.host.crontab_listing().await?;
        Ok(match listed_entries(&listing) {
            Some(entries) => ToolOutput::success()
                .with_type("crontab_count")
                .field("count", entries.len()),
            None => ToolOutput::warning()
                .with_type("crontab_count")
                .field("count", 0)
                .field("message", "No crontab entries found or error occurred."),
        })
    }
}

/// Parameters of `search_crontab_entries`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SearchParams {
    /// Literal text to look for in each crontab line.
    pub search_term: String,
}

/// `search_crontab_entries`
///
/// Matches the term as a literal, case-sensitive substring of each line.
pub struct SearchCrontabEntries {
    host: Arc<dyn HostProbe>,
}

impl SearchCrontabEntries {
    pub fn new(host: Arc<dyn HostProbe>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl Tool for SearchCrontabEntries {
    type Params = SearchParams;

    const NAME: &'static str = "search_crontab_entries";
    const DESCRIPTION: &'static str = "Search for crontab entries containing a specific term";

    async fn run(&self, params: SearchParams) -> Result<ToolOutput, ToolError> {
        let term = params.search_term;
        info!(
            target: "crontab_explorer::tools",
            tool = Self::NAME,
            search_term = %term,
            "Tool call"
        );
        if term.is_empty() {
            return Err(ToolError::InvalidParameters(
                "search_term must not be empty".into(),
            ));
        }

        let listing = self.host.crontab_listing().await?;
        let matches: Vec<String> = listed_entries(&listing)
            .unwrap_or_default()
            .into_iter()
            .filter(|line| line.contains(term.as_str()))
            .collect();

        if matches.is_empty() {
            let message = format!("No crontab entries found containing '{term}' or error occurred.");
            return Ok(ToolOutput::warning()
                .with_type("search_results")
                .field("query", term)
                .field("count", 0)
                .field("message", message));
        }

        let raw_data: String = matches.iter().map(|line| format!("{line}\n")).collect();
        Ok(ToolOutput::success()
            .with_type("search_results")
            .field("query", term)
            .field("count", matches.len())
            .field("entries", matches)
            .field("raw_data", raw_data))
    }
}
