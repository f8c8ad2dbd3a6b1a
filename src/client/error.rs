use std::time::Duration;

use thiserror::Error;

/// Failures surfaced by the protocol client. Each variant is reported distinctly.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Connection error - server not running at {url}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request to {url} timed out after {timeout_secs}s - server might be busy")]
    Timeout { url: String, timeout_secs: u64 },
    #[error("Request error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Server returned status code {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Server returned empty response")]
    EmptyBody,
    #[error("Invalid JSON response: {body}")]
    InvalidJson {
        body: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Timed out waiting for server at {url} after {attempts} attempts")]
    ServerUnreachable { url: String, attempts: u32 },
    #[error("failed to read input: {0}")]
    Input(#[from] std::io::Error),
}

impl ClientError {
    /// Classify a `reqwest` failure for `url`.
    pub fn from_request(url: &str, timeout: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout {
                url: url.to_string(),
                timeout_secs: timeout.as_secs(),
            }
        } else if err.is_connect() {
            ClientError::Connection {
                url: url.to_string(),
                source: err,
            }
        } else {
            ClientError::Transport(err)
        }
    }

    /// HTTP status for [`ClientError::Status`].
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
