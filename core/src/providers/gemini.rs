use crate::traits::{
    ChatRequest, ChatResponse, Provider, ResponsePart, ToolCall, ToolSpec, Turn, TurnPayload,
    TurnRole,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<GeminiFunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<GeminiFunctionResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(default)]
    args: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            model: "gemini-2.0-flash-001".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
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

    fn convert_turns(&self, turns: &[Turn]) -> Vec<GeminiContent> {
        turns
            .iter()
            .map(|turn| match &turn.payload {
                TurnPayload::Text(text) => GeminiContent {
                    role: match turn.role {
                        TurnRole::Model => "model",
                        _ => "user",
                    }
                    .to_string(),
                    parts: vec![GeminiPart {
                        text: Some(text.clone()),
                        ..Default::default()
                    }],
                },
                TurnPayload::ToolRequest(call) => GeminiContent {
                    role: "model".to_string(),
                    parts: vec![GeminiPart {
                        function_call: Some(GeminiFunctionCall {
                            id: None,
                            name: call.name.clone(),
                            args: call.arguments.clone(),
                        }),
                        ..Default::default()
                    }],
                },
                TurnPayload::ToolResult { name, content, .. } => GeminiContent {
                    role: "user".to_string(),
                    parts: vec![GeminiPart {
                        function_response: Some(GeminiFunctionResponse {
                            id: None,
                            name: name.clone(),
                            response: json!({ "result": content }),
                        }),
                        ..Default::default()
                    }],
                },
            })
            .collect()
    }

    fn convert_tools(&self, tools: &[ToolSpec]) -> Vec<GeminiTool> {
        vec![GeminiTool {
            function_declarations: tools
                .iter()
                .map(|t| GeminiFunctionDeclaration {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters_schema.clone(),
                })
                .collect(),
        }]
    }

    fn convert_response(response: GeminiResponse) -> anyhow::Result<ChatResponse> {
        if response.candidates.is_empty() {
            return Err(anyhow::anyhow!("No candidates in response"));
        }

        let parts: Vec<ResponsePart> = response
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|content| content.parts)
            .filter_map(|part| {
                if let Some(call) = part.function_call {
                    Some(ResponsePart::ToolCall(ToolCall {
                        id: call
                            .id
                            .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple())),
                        name: call.name,
                        arguments: call.args,
                    }))
                } else {
                    part.text.map(ResponsePart::Text)
                }
            })
            .collect();

        if parts.is_empty() {
            return Err(anyhow::anyhow!(
                "Empty response from API: no content or tool calls"
            ));
        }
        Ok(ChatResponse { parts })
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn chat(&self, request: ChatRequest<'_>) -> anyhow::Result<ChatResponse> {
        let gemini_request = GeminiRequest {
            contents: self.convert_turns(request.turns),
            tools: request
                .tools
                .map(|t| self.convert_tools(t))
                .unwrap_or_default(),
        };

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&gemini_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Gemini API error {}: {}",
                status,
                error_text
            ));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        Self::convert_response(gemini_response)
    }
}
