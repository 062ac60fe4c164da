use crate::agent::ToolRegistry;
use crate::error::Result;
use crate::mcp::protocol::{
    CallToolResult, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, JsonRpcMessage, METHOD_NOT_FOUND,
    McpToolDef, PARSE_ERROR, PROTOCOL_VERSION,
};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

/// Serves a [`ToolRegistry`] to a single client, one request at a time.
pub struct McpServer {
    name: String,
    version: String,
    registry: ToolRegistry,
}

impl McpServer {
    pub fn new(name: impl Into<String>, registry: ToolRegistry) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            registry,
        }
    }

    /// Serves on the process's own stdin/stdout until stdin closes.
    pub async fn serve_stdio(&self) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(
            "{} serving {} tools over stdio",
            self.name,
            self.registry.len()
        );
        let mut lines = BufReader::new(reader).lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(reply) = self.handle_line(&line).await {
                let mut out = serde_json::to_string(&reply)?;
                out.push('\n');
                writer.write_all(out.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        info!("Client closed the connection");
        Ok(())
    }

    /// Returns the reply for one input line, or `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcMessage> {
        let message: JsonRpcMessage = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                warn!("Unparseable request: {}", e);
                return Some(JsonRpcMessage::error_response(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {e}"),
                ));
            }
        };

        if message.is_notification() {
            debug!("Notification: {:?}", message.method);
            return None;
        }

        let id = message.id.clone().unwrap_or(Value::Null);
        let Some(method) = message.method.as_deref() else {
            return Some(JsonRpcMessage::error_response(
                id,
                INVALID_REQUEST,
                "Missing method",
            ));
        };

        let reply = match method {
            "initialize" => JsonRpcMessage::response(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {"tools": {}},
                    "serverInfo": {"name": self.name, "version": self.version},
                }),
            ),
            "ping" => JsonRpcMessage::response(id, json!({})),
            "tools/list" => {
                let tools: Vec<McpToolDef> = self
                    .registry
                    .get_specs()
                    .into_iter()
                    .map(McpToolDef::from)
                    .collect();
                JsonRpcMessage::response(id, json!({ "tools": tools }))
            }
            "tools/call" => self.call_tool(id, message.params).await,
            other => JsonRpcMessage::error_response(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            ),
        };
        Some(reply)
    }

    async fn call_tool(&self, id: Value, params: Option<Value>) -> JsonRpcMessage {
        let params = params.unwrap_or(Value::Null);
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcMessage::error_response(id, INVALID_PARAMS, "Missing tool name");
        };
        let args = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| json!({}));

        info!("Executing tool {}", name);
        let result = self.registry.execute(name, args).await;
        if let Some(error) = &result.error {
            warn!("Tool {} failed: {}", name, error);
        }

        match serde_json::to_value(CallToolResult::from(result)) {
            Ok(value) => JsonRpcMessage::response(id, value),
            Err(e) => JsonRpcMessage::error_response(id, INTERNAL_ERROR, e.to_string()),
        }
    }
}
