//! The JSON envelope every tool invocation returns.

use chrono::{Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const RESERVED_KEYS: &[&str] = &["status", "timestamp"];

/// Envelope tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Warning,
    Online,
    Error,
}

impl ToolStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ToolStatus::Success => "success",
            ToolStatus::Warning => "warning",
            ToolStatus::Online => "online",
            ToolStatus::Error => "error",
        }
    }

    pub const fn is_failure(&self) -> bool {
        matches!(self, ToolStatus::Error)
    }
}

/// Response envelope: `status`, tool-specific fields, `timestamp`.
///
/// `status` and `timestamp` are always present; tool fields are flattened
/// between them on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub status: ToolStatus,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub timestamp: String,
}

impl ToolOutput {
    pub fn new(status: ToolStatus) -> Self {
        Self {
            status,
            fields: Map::new(),
            timestamp: now_timestamp(),
        }
    }

    pub fn success() -> Self {
        Self::new(ToolStatus::Success)
    }

    pub fn warning() -> Self {
        Self::new(ToolStatus::Warning)
    }

    pub fn online() -> Self {
        Self::new(ToolStatus::Online)
    }

    /// `{"status": "error", "message": ..., "timestamp": ...}`
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(ToolStatus::Error).field("message", message.into())
    }

    /// Set the `type` discriminator used by the crontab and log tools.
    pub fn with_type(self, kind: &str) -> Self {
        self.field("type", kind)
    }

    /// Add a tool-specific field. `status` and `timestamp` are owned by the
    /// envelope and are ignored here.
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        if !RESERVED_KEYS.contains(&key) {
            self.fields.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn message(&self) -> Option<&str> {
        self.get("message").and_then(Value::as_str)
    }
}

/// ISO-8601 local timestamp with microseconds.
pub fn now_timestamp() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
