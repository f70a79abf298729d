mod health;
mod invoke;
mod mcp;

pub use health::health;
pub use invoke::{invoke_tool, list_tools};
pub use mcp::mcp_request;
