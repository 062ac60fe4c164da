use crate::error::Result;
use crate::traits::{ToolResult, ToolSpec};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Channel to a process hosting tools: lists them and runs them by name.
///
/// A session is owned by exactly one client for its whole lifetime and must be
/// closed on every exit path.
#[async_trait]
pub trait ToolSession: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>>;

    async fn call_tool(&self, name: &str, args: &Map<String, Value>) -> Result<ToolResult>;

    async fn close(&self) -> Result<()>;
}
