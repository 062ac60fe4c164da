use crate::traits::{ToolResult, ToolSpec};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// A JSON-RPC 2.0 request, notification or response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcMessage {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcMessage {
    fn empty() -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            method: None,
            params: None,
            result: None,
            error: None,
        }
    }

    pub fn request(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            id: Some(json!(id)),
            method: Some(method.into()),
            params,
            ..Self::empty()
        }
    }

    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            method: Some(method.into()),
            params,
            ..Self::empty()
        }
    }

    pub fn response(id: Value, result: Value) -> Self {
        Self {
            id: Some(id),
            result: Some(result),
            ..Self::empty()
        }
    }

    pub fn error_response(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
            ..Self::empty()
        }
    }

    pub fn is_notification(&self) -> bool {
        self.method.is_some() && self.id.is_none()
    }

    pub fn is_response_to(&self, id: u64) -> bool {
        self.method.is_none() && self.id.as_ref().and_then(Value::as_u64) == Some(id)
    }
}

/// A tool entry of a `tools/list` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpToolDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl From<McpToolDef> for ToolSpec {
    fn from(def: McpToolDef) -> Self {
        ToolSpec {
            name: def.name,
            description: def.description.unwrap_or_default(),
            parameters_schema: def.input_schema,
        }
    }
}

impl From<ToolSpec> for McpToolDef {
    fn from(spec: ToolSpec) -> Self {
        McpToolDef {
            name: spec.name,
            description: Some(spec.description),
            input_schema: spec.parameters_schema,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsListResult {
    pub tools: Vec<McpToolDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

/// Result of `tools/call`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ContentItem>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl CallToolResult {
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|item| match item {
                ContentItem::Text { text } => Some(text.as_str()),
                ContentItem::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<ToolResult> for CallToolResult {
    fn from(result: ToolResult) -> Self {
        let text = if result.success {
            result.output
        } else {
            result.error.unwrap_or_else(|| "Tool failed".to_string())
        };
        CallToolResult {
            content: vec![ContentItem::Text { text }],
            is_error: !result.success,
        }
    }
}

impl From<CallToolResult> for ToolResult {
    fn from(result: CallToolResult) -> Self {
        let text = result.text();
        if result.is_error {
            ToolResult::error(text)
        } else {
            ToolResult::success(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_empty_fields() {
        let message = JsonRpcMessage::request(7, "tools/list", None);
        let encoded = serde_json::to_value(&message).unwrap();
        assert_eq!(
            encoded,
            json!({"jsonrpc": "2.0", "id": 7, "method": "tools/list"})
        );
    }

    #[test]
    fn classifies_messages() {
        let notification: JsonRpcMessage = serde_json::from_str(
            r#"{"jsonrpc":"2.0","method":"notifications/message","params":{"level":"info"}}"#,
        )
        .unwrap();
        assert!(notification.is_notification());
        assert!(!notification.is_response_to(1));

        let response: JsonRpcMessage =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":{}}"#).unwrap();
        assert!(response.is_response_to(1));
        assert!(!response.is_response_to(2));
    }

    #[test]
    fn call_result_ignores_non_text_content() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "Bitcoin rallies"},
                {"type": "image", "data": "...", "mimeType": "image/png"},
                {"type": "text", "text": "ETH upgrade ships"}
            ]
        }))
        .unwrap();
        assert!(!result.is_error);
        assert_eq!(result.text(), "Bitcoin rallies\nETH upgrade ships");
    }

    #[test]
    fn error_flag_maps_to_failed_tool_result() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [{"type": "text", "text": "search job abc did not complete in time"}],
            "isError": true
        }))
        .unwrap();
        let tool_result = ToolResult::from(result);
        assert!(!tool_result.success);
        assert_eq!(
            tool_result.error.as_deref(),
            Some("search job abc did not complete in time")
        );
    }

    #[test]
    fn tool_def_uses_camel_case_schema_key() {
        let def: McpToolDef = serde_json::from_value(json!({
            "name": "fetch_crypto_news",
            "inputSchema": {"type": "object"}
        }))
        .unwrap();
        let spec = ToolSpec::from(def);
        assert_eq!(spec.description, "");
        assert_eq!(spec.parameters_schema, json!({"type": "object"}));
    }
}
