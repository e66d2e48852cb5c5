//! MCP server over stdio.
//!
//! - [`protocol`]: JSON-RPC envelopes and MCP payload types
//! - [`registry`]: the [`Tool`] trait and [`ToolRegistry`]
//! - [`dispatcher`]: request routing and the serve loop
//! - [`resources`]: `resources/list` providers
//! - [`tools`]: built-in tools over the vector store

pub mod dispatcher;
pub mod protocol;
pub mod registry;
pub mod resources;
pub mod tools;

pub use dispatcher::Dispatcher;
pub use protocol::{
    CallToolResult, Content, ErrorCode, JsonRpcError, JsonRpcRequest, JsonRpcResponse, Resource,
    ResourceTemplate, ToolDescriptor,
};
pub use registry::{FnTool, InvokeError, Tool, ToolRegistry};
pub use resources::{ResourceProvider, SourceResources, StaticResources};
pub use tools::{register_builtin_tools, ToolContext};
