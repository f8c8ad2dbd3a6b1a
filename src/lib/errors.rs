use std::{io, path::PathBuf};

use config::ConfigError as ConfigLoaderError;
use thiserror::Error;

/// Errors that can occur while loading or validating configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to build (read) the configuration file.
    #[error("Failed to read configuration file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Failed to deserialize TOML into a struct.
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Field failed validation.
    #[error("Configuration file {path} has invalid `{field}`: {message}")]
    InvalidField {
        path: PathBuf,
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    /// Helper to wrap `config::ConfigError` as a read failure.
    pub fn from_read_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::FileRead { path, source }
    }

    /// Helper to wrap `config::ConfigError` as a parse failure.
    pub fn from_parse_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::Parse { path, source }
    }
}

/// Errors raised while building the tool registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Tool `{name}` is already registered")]
    DuplicateName { name: String },
    #[error("Tool name `{name}` is invalid: {reason}")]
    InvalidName { name: String, reason: &'static str },
}

/// Failures from the host command runner.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("`{program}` did not finish within {duration_secs} seconds")]
    Timeout { program: String, duration_secs: u64 },
}

/// Failures reported by a tool invocation.
///
/// These never become protocol errors; the dispatcher turns them into an
/// `"error"` envelope.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("missing required parameter '{name}'")]
    MissingParameter { name: String },
    #[error("unexpected parameter '{name}'")]
    UnexpectedParameter { name: String },
    #[error("{0}")]
    InvalidParameters(String),
    #[error(transparent)]
    Host(#[from] ShellError),
    #[error("{0}")]
    Failed(String),
}

impl ToolError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Protocol-level errors surfaced as HTTP error statuses.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid endpoint")]
    InvalidEndpoint,
    #[error("Tool '{name}' not found")]
    ToolNotFound { name: String },
    #[error("Error calling tool: {cause}")]
    DispatchFault { cause: String },
    #[error("Method not allowed")]
    MethodNotAllowed,
    /// The request line or body could not be read; carries the HTTP status to answer with.
    #[error("{reason}")]
    MalformedRequest { status: u16, reason: String },
}

impl ProtocolError {
    /// HTTP status code carried by the error response.
    pub const fn status_code(&self) -> u16 {
        match self {
            ProtocolError::InvalidEndpoint | ProtocolError::ToolNotFound { .. } => 404,
            ProtocolError::DispatchFault { .. } => 500,
            ProtocolError::MethodNotAllowed => 405,
            ProtocolError::MalformedRequest { status, .. } => *status,
        }
    }

    /// JSON body `{"error": "<message>"}`.
    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.to_string() })
    }
}
