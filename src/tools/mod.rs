//! Host inspection tools served by the runtime and the glue that registers them.

pub mod crontab;
pub mod envelope;
pub mod host;
pub mod logs;
pub mod status;

use std::{marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{Map, Value};

use crate::{
    lib::errors::{RegistryError, ToolError},
    server::{
        config::ToolsSection,
        runtime::{ParameterSchema, ToolHandler, ToolRegistry},
    },
};

pub use crontab::{CountCrontabEntries, FetchCrontabEntries, SearchCrontabEntries, SearchParams};
pub use envelope::{now_timestamp, ToolOutput, ToolStatus};
pub use host::{HostProbe, SystemHostProbe};
pub use logs::ShowScheduledTaskSummary;
pub use status::{CheckServerStatus, SERVER_NAME};

/// Parameter set for tools that take no arguments.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NoParams {}

/// A tool with a typed parameter struct.
#[async_trait]
pub trait Tool: Send + Sync + 'static {
    type Params: DeserializeOwned + JsonSchema + Send;

    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    async fn run(&self, params: Self::Params) -> Result<ToolOutput, ToolError>;
}

/// Adapts a [`Tool`] to the untyped [`ToolHandler`] the registry stores.
pub struct TypedHandler<T: Tool> {
    tool: T,
    _params: PhantomData<fn() -> T::Params>,
}

impl<T: Tool> TypedHandler<T> {
    pub fn new(tool: T) -> Self {
        Self {
            tool,
            _params: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Tool> ToolHandler for TypedHandler<T> {
    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::of::<T::Params>()
    }

    async fn call(&self, params: Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let typed: T::Params = serde_json::from_value(Value::Object(params))
            .map_err(|err| ToolError::InvalidParameters(err.to_string()))?;
        self.tool.run(typed).await
    }
}

/// Register a typed tool under its declared name.
pub fn register_tool<T: Tool>(registry: &mut ToolRegistry, tool: T) -> Result<(), RegistryError> {
    registry.register(
        T::NAME,
        T::DESCRIPTION,
        Arc::new(TypedHandler::new(tool)),
    )
}

/// Register the built-in crontab, log and status tools.
///
/// `check_server_status` goes last so it can report the final tool count.
pub fn register_builtin_tools(
    registry: &mut ToolRegistry,
    host: Arc<dyn HostProbe>,
    settings: &ToolsSection,
) -> Result<(), RegistryError> {
    register_tool(registry, FetchCrontabEntries::new(Arc::clone(&host)))?;
    register_tool(registry, CountCrontabEntries::new(Arc::clone(&host)))?;
    register_tool(
        registry,
        ShowScheduledTaskSummary::new(
            Arc::clone(&host),
            settings.log_path.clone(),
            settings.log_tail_lines,
        ),
    )?;
    register_tool(registry, SearchCrontabEntries::new(host))?;
    let tools_available = registry.len() + 1;
    register_tool(registry, CheckServerStatus::new(tools_available))
}
