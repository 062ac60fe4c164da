use crate::traits::ToolSpec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TurnRole {
    User,
    Model,
    ToolRequest,
    ToolResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TurnPayload {
    Text(String),
    ToolRequest(ToolCall),
    ToolResult {
        call_id: String,
        name: String,
        content: String,
    },
}

/// One unit of conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub payload: TurnPayload,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            payload: TurnPayload::Text(text.into()),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            payload: TurnPayload::Text(text.into()),
        }
    }

    pub fn tool_request(call: ToolCall) -> Self {
        Self {
            role: TurnRole::ToolRequest,
            payload: TurnPayload::ToolRequest(call),
        }
    }

    pub fn tool_result(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::ToolResult,
            payload: TurnPayload::ToolResult {
                call_id: call.id.clone(),
                name: call.name.clone(),
                content: content.into(),
            },
        }
    }
}

/// A single piece of a model response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePart {
    Text(String),
    ToolCall(ToolCall),
}

#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    pub parts: Vec<ResponsePart>,
}

impl ChatResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![ResponsePart::Text(text.into())],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub turns: &'a [Turn],
    pub tools: Option<&'a [ToolSpec]>,
}

#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    async fn chat(&self, request: ChatRequest<'_>) -> anyhow::Result<ChatResponse>;
}
