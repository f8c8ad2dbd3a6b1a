//! Resolves a tool name and request body into a response envelope.
use std::{any::Any, sync::Arc};

use serde_json::{Map, Value};
use tracing::{error, warn, Instrument};

use crate::{
    lib::{errors::ProtocolError, telemetry::InvocationSpan},
    tools::ToolOutput,
};

use super::ToolRegistry;

/// Message of the failure envelope returned for an unparseable body.
pub const INVALID_PARAMETERS_MESSAGE: &str = "invalid parameters";

/// Result of one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The call completed; the envelope may still report a tool failure.
    Completed(ToolOutput),
    NotFound { name: String },
    /// The dispatch mechanism itself failed (the handler task died).
    Fault { cause: String },
}

impl DispatchOutcome {
    pub fn into_result(self) -> Result<ToolOutput, ProtocolError> {
        match self {
            DispatchOutcome::Completed(output) => Ok(output),
            DispatchOutcome::NotFound { name } => Err(ProtocolError::ToolNotFound { name }),
            DispatchOutcome::Fault { cause } => Err(ProtocolError::DispatchFault { cause }),
        }
    }
}

/// Fault-containment boundary between the protocol server and tool handlers.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Resolve `tool_name`, parse and validate `raw_body`, and run the tool.
    ///
    /// The handler runs on its own task so a panic is reported as
    /// [`DispatchOutcome::Fault`] instead of tearing down the connection.
    pub async fn dispatch(&self, tool_name: &str, raw_body: &[u8]) -> DispatchOutcome {
        let Some(entry) = self.registry.resolve(tool_name) else {
            warn!(
                target: "crontab_explorer::dispatch",
                tool = tool_name,
                "Rejected invocation of unknown tool"
            );
            return DispatchOutcome::NotFound {
                name: tool_name.to_string(),
            };
        };

        let span = InvocationSpan::start(tool_name);

        let params = match parse_parameters(raw_body) {
            Ok(params) => params,
            Err(reason) => {
                warn!(
                    target: "crontab_explorer::dispatch",
                    tool = tool_name,
                    request_id = %span.request_id(),
                    reason = %reason,
                    "Rejected invocation with malformed parameters"
                );
                span.finish("error");
                return DispatchOutcome::Completed(ToolOutput::failure(INVALID_PARAMETERS_MESSAGE));
            }
        };

        if let Err(err) = entry.parameters().validate(&params) {
            warn!(
                target: "crontab_explorer::dispatch",
                tool = tool_name,
                request_id = %span.request_id(),
                reason = %err,
                "Parameters do not match the tool schema"
            );
            span.finish("error");
            return DispatchOutcome::Completed(ToolOutput::failure(format!("Error: {err}")));
        }

        let handler = entry.handler();
        let task = tokio::spawn(
            async move { handler.call(params).await }.instrument(span.span().clone()),
        );

        match task.await {
            Ok(Ok(output)) => {
                span.finish(output.status.as_str());
                DispatchOutcome::Completed(output)
            }
            Ok(Err(err)) => {
                error!(
                    target: "crontab_explorer::dispatch",
                    tool = tool_name,
                    request_id = %span.request_id(),
                    error = %err,
                    "Tool reported a failure"
                );
                span.finish("error");
                DispatchOutcome::Completed(ToolOutput::failure(format!("Error: {err}")))
            }
            Err(join_err) => {
                let cause = if join_err.is_panic() {
                    panic_message(join_err.into_panic())
                } else {
                    join_err.to_string()
                };
                error!(
                    target: "crontab_explorer::dispatch",
                    tool = tool_name,
                    request_id = %span.request_id(),
                    cause = %cause,
                    "Tool handler aborted"
                );
                span.finish("fault");
                DispatchOutcome::Fault { cause }
            }
        }
    }
}

/// Empty or whitespace-only bodies mean "no parameters"; anything else must be a JSON object.
pub fn parse_parameters(raw_body: &[u8]) -> Result<Map<String, Value>, String> {
    if raw_body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(raw_body) {
        Ok(Value::Object(params)) => Ok(params),
        Ok(other) => Err(format!("expected a JSON object, got {}", json_kind(&other))),
        Err(err) => Err(err.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "tool handler panicked".to_string()
}
