pub mod dispatch;
pub mod jsonrpc;
pub mod server;
pub mod stdio;
pub mod tools;

pub use dispatch::{Dispatcher, ToolError, ToolOutcome};
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use server::McpServer;
pub use tools::{ToolDefinition, ToolName, ToolRegistry};
