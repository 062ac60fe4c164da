use crate::traits::{
    ChatRequest, ChatResponse, Provider, ResponsePart, ToolCall, ToolSpec, Turn, TurnPayload,
    TurnRole,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool<'a>>>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage<'a> {
    role: &'a str,
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCallRequest<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct OpenAIToolCallRequest<'a> {
    id: &'a str,
    r#type: &'a str,
    function: OpenAIFunctionRequest<'a>,
}

#[derive(Debug, Serialize)]
struct OpenAIFunctionRequest<'a> {
    name: &'a str,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct OpenAITool<'a> {
    r#type: &'a str,
    function: OpenAIToolFunction<'a>,
}

#[derive(Debug, Serialize)]
struct OpenAIToolFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIToolCall {
    id: String,
    function: OpenAIFunction,
}

#[derive(Debug, Deserialize)]
struct OpenAIFunction {
    name: String,
    arguments: String,
}

pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn convert_turns<'a>(&self, turns: &'a [Turn]) -> Vec<OpenAIMessage<'a>> {
        turns
            .iter()
            .map(|turn| match &turn.payload {
                TurnPayload::Text(text) => OpenAIMessage {
                    role: match turn.role {
                        TurnRole::Model => "assistant",
                        _ => "user",
                    },
                    content: Some(text.as_str()),
                    tool_calls: None,
                    tool_call_id: None,
                },
                TurnPayload::ToolRequest(call) => OpenAIMessage {
                    role: "assistant",
                    content: None,
                    tool_calls: Some(vec![OpenAIToolCallRequest {
                        id: &call.id,
                        r#type: "function",
                        function: OpenAIFunctionRequest {
                            name: &call.name,
                            arguments: Value::Object(call.arguments.clone()).to_string(),
                        },
                    }]),
                    tool_call_id: None,
                },
                TurnPayload::ToolResult {
                    call_id, content, ..
                } => OpenAIMessage {
                    role: "tool",
                    content: Some(content.as_str()),
                    tool_calls: None,
                    tool_call_id: Some(call_id.as_str()),
                },
            })
            .collect()
    }

    fn convert_tools<'a>(&self, tools: &'a [ToolSpec]) -> Vec<OpenAITool<'a>> {
        tools
            .iter()
            .map(|t| OpenAITool {
                r#type: "function",
                function: OpenAIToolFunction {
                    name: &t.name,
                    description: &t.description,
                    parameters: &t.parameters_schema,
                },
            })
            .collect()
    }

    fn convert_response(response: OpenAIResponse) -> anyhow::Result<ChatResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("No choices in response"))?;

        let mut parts = Vec::new();
        if let Some(content) = choice.message.content.filter(|c| !c.trim().is_empty()) {
            parts.push(ResponsePart::Text(content));
        }

        for call in choice.message.tool_calls.unwrap_or_default() {
            let arguments: Map<String, Value> = if call.function.arguments.trim().is_empty() {
                Map::new()
            } else {
                serde_json::from_str(&call.function.arguments).map_err(|e| {
                    anyhow::anyhow!(
                        "Failed to parse tool arguments for {}: {}",
                        call.function.name,
                        e
                    )
                })?
            };
            parts.push(ResponsePart::ToolCall(ToolCall {
                id: call.id,
                name: call.function.name,
                arguments,
            }));
        }

        if parts.is_empty() {
            return Err(anyhow::anyhow!(
                "Empty response from API: no content or tool calls"
            ));
        }
        Ok(ChatResponse { parts })
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat(&self, request: ChatRequest<'_>) -> anyhow::Result<ChatResponse> {
        let openai_request = OpenAIRequest {
            model: &self.model,
            messages: self.convert_turns(request.turns),
            tools: request.tools.map(|t| self.convert_tools(t)),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&openai_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "OpenAI API error {}: {}",
                status,
                error_text
            ));
        }

        let openai_response: OpenAIResponse = response.json().await?;
        Self::convert_response(openai_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_exchange_maps_to_assistant_and_tool_messages() {
        let provider = OpenAIProvider::new("key");
        let mut arguments = Map::new();
        arguments.insert("crypto_name".into(), json!("bitcoin"));
        let call = ToolCall {
            id: "call_9".into(),
            name: "fetch_crypto_news".into(),
            arguments,
        };
        let turns = vec![
            Turn::user("news?"),
            Turn::tool_request(call.clone()),
            Turn::tool_result(&call, "A"),
        ];

        let messages = serde_json::to_value(provider.convert_turns(&turns)).unwrap();
        assert_eq!(
            messages,
            json!([
                {"role": "user", "content": "news?"},
                {"role": "assistant", "content": null, "tool_calls": [{
                    "id": "call_9",
                    "type": "function",
                    "function": {"name": "fetch_crypto_news", "arguments": "{\"crypto_name\":\"bitcoin\"}"}
                }]},
                {"role": "tool", "content": "A", "tool_call_id": "call_9"}
            ])
        );
    }

    #[test]
    fn parses_text_then_tool_calls() {
        let response: OpenAIResponse = serde_json::from_value(json!({
            "choices": [{"message": {
                "content": "Let me check.",
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "fetch_crypto_news", "arguments": "{\"crypto_name\":\"eth\"}"}
                }]
            }}]
        }))
        .unwrap();

        let parts = OpenAIProvider::convert_response(response).unwrap().parts;
        assert_eq!(parts[0], ResponsePart::Text("Let me check.".into()));
        match &parts[1] {
            ResponsePart::ToolCall(call) => {
                assert_eq!(call.id, "call_1");
                assert_eq!(call.arguments["crypto_name"], "eth");
            }
            other => panic!("unexpected part: {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_arguments() {
        let response: OpenAIResponse = serde_json::from_value(json!({
            "choices": [{"message": {"content": null, "tool_calls": [{
                "id": "call_1",
                "function": {"name": "fetch_crypto_news", "arguments": "{not json"}
            }]}}]
        }))
        .unwrap();
        assert!(OpenAIProvider::convert_response(response).is_err());
    }
}
