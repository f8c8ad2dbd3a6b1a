//! Tool registry, dispatch and the HTTP server that exposes them.
mod dispatcher;
pub mod http;
mod server_info;
mod startup;
mod tool_registry;

pub use dispatcher::{parse_parameters, DispatchOutcome, Dispatcher, INVALID_PARAMETERS_MESSAGE};
pub use http::{router, serve, ServerContext};
pub use server_info::{describe_listener, ServerInfo};
pub use startup::{build_context, port_in_use, run_server, RuntimeExit};
pub use tool_registry::{
    ParameterSchema, ParameterSpec, ToolDescriptor, ToolEntry, ToolHandler, ToolRegistry,
};
