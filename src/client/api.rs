//! HTTP calls against the tool server.
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    server::runtime::{ServerInfo, ToolDescriptor},
    tools::ToolOutput,
};

use super::ClientError;

pub const LIVENESS_TIMEOUT: Duration = Duration::from_secs(2);
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(2);
pub const INVOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Thin client for the discovery, invocation and liveness endpoints.
#[derive(Debug, Clone)]
pub struct ToolClient {
    http: reqwest::Client,
    host: String,
    port: u16,
    base_url: String,
}

impl ToolClient {
    pub fn new(host: &str, port: u16) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(ClientError::Transport)?;
        Ok(Self {
            http,
            host: host.to_string(),
            port,
            base_url: format!("http://{host}:{port}"),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `GET /`: confirms the peer speaks the protocol.
    pub async fn liveness(&self) -> Result<ServerInfo, ClientError> {
        let url = format!("{}/", self.base_url);
        let response = self
            .http
            .get(&url)
            .timeout(LIVENESS_TIMEOUT)
            .send()
            .await
            .map_err(|err| ClientError::from_request(&url, LIVENESS_TIMEOUT, err))?;
        read_json(&url, LIVENESS_TIMEOUT, response).await
    }

    /// `GET /tools`
    pub async fn discover(&self) -> Result<Vec<ToolDescriptor>, ClientError> {
        let url = format!("{}/tools", self.base_url);
        debug!(target: "crontab_explorer::client", url = %url, "Requesting tools list");
        let response = self
            .http
            .get(&url)
            .timeout(DISCOVERY_TIMEOUT)
            .send()
            .await
            .map_err(|err| ClientError::from_request(&url, DISCOVERY_TIMEOUT, err))?;
        read_json(&url, DISCOVERY_TIMEOUT, response).await
    }

    /// `POST /tools/{name}` with `params` as the JSON body.
    pub async fn invoke(
        &self,
        tool_name: &str,
        params: &Map<String, Value>,
    ) -> Result<ToolOutput, ClientError> {
        let url = format!("{}/tools/{tool_name}", self.base_url);
        debug!(target: "crontab_explorer::client", url = %url, "Invoking tool");
        let response = self
            .http
            .post(&url)
            .json(params)
            .timeout(INVOCATION_TIMEOUT)
            .send()
            .await
            .map_err(|err| ClientError::from_request(&url, INVOCATION_TIMEOUT, err))?;
        read_json(&url, INVOCATION_TIMEOUT, response).await
    }
}

async fn read_json<T: DeserializeOwned>(
    url: &str,
    timeout: Duration,
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| ClientError::from_request(url, timeout, err))?;
    if status != StatusCode::OK {
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }
    if body.trim().is_empty() {
        return Err(ClientError::EmptyBody);
    }
    serde_json::from_str(&body).map_err(|source| ClientError::InvalidJson { body, source })
}
