//! Tool sessions over newline-delimited JSON-RPC 2.0 on stdio.
//!
//! The client side spawns the tool-hosting process and implements
//! [`ToolSession`](crate::traits::ToolSession); the server side answers
//! `initialize`, `tools/list` and `tools/call` for a [`ToolRegistry`](crate::agent::ToolRegistry).

pub mod client;
pub mod protocol;
pub mod server;

pub use client::{StdioSession, launch_command};
pub use protocol::{CallToolResult, JsonRpcError, JsonRpcMessage, McpToolDef};
pub use server::McpServer;
