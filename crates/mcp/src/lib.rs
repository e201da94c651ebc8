//! MCP (Model Context Protocol) server library.
//!
//! Serves tools to an assistant over line-delimited JSON-RPC 2.0 on stdio.
//! What the tools are, and how they run, is up to the [`ToolService`].
//!
//! # Example
//!
//! ```no_run
//! use mcp::{CallToolResult, McpServer, ServerInfo, Tool, ToolService};
//! use serde_json::Value;
//!
//! struct NoTools;
//!
//! impl ToolService for NoTools {
//!     fn tools(&self) -> Vec<Tool> {
//!         Vec::new()
//!     }
//!
//!     async fn call(&self, name: &str, _arguments: Value) -> CallToolResult {
//!         CallToolResult::text(format!("unknown tool: {name}"), true)
//!     }
//! }
//!
//! # async fn example() -> mcp::Result<()> {
//! let info = ServerInfo {
//!     name: "example".to_string(),
//!     version: "0.1.0".to_string(),
//! };
//! McpServer::new(info, NoTools).serve_stdio().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod protocol;
mod server;

pub use error::{Error, Result};
pub use protocol::{
    CallToolParams, CallToolResult, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, PROTOCOL_VERSION, RequestId, ServerInfo, Tool, ToolContent, codes,
};
pub use server::{MAX_MESSAGE_SIZE, McpServer, ToolService};
