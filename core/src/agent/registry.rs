use crate::traits::{Tool, ToolResult, ToolSpec};
use std::sync::Arc;

/// Tools served by this process, looked up by name.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool. A later tool with the same name replaces the earlier
    /// one so names stay unique.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn get_specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub async fn execute(&self, name: &str, args: serde_json::Value) -> ToolResult {
        let tool = self.tools.iter().find(|t| t.name() == name);

        match tool {
            Some(tool) => match tool.execute(args).await {
                Ok(result) => result,
                Err(e) => ToolResult::error(format!("Execution failed: {:#}", e)),
            },
            None => ToolResult::error(format!("Tool '{}' not found", name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the text argument"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }

        async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
            match args.get("text").and_then(|v| v.as_str()) {
                Some(text) => Ok(ToolResult::success(text)),
                None => anyhow::bail!("Missing 'text' parameter"),
            }
        }
    }

    #[tokio::test]
    async fn executes_registered_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        let result = registry.execute("echo", json!({"text": "gm"})).await;
        assert!(result.success);
        assert_eq!(result.output, "gm");
    }

    #[tokio::test]
    async fn tool_errors_become_error_results() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        let result = registry.execute("echo", json!({})).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("Missing 'text' parameter"));
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_result() {
        let registry = ToolRegistry::new();
        let result = registry.execute("nope", json!({})).await;
        assert_eq!(result.error.as_deref(), Some("Tool 'nope' not found"));
    }

    #[test]
    fn names_stay_unique() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(EchoTool));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_specs()[0].name, "echo");
    }
}
