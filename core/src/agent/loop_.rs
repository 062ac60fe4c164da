use crate::agent::Conversation;
use crate::agent::schema::adapt_tool_specs;
use crate::error::{NewsdeskError, Result};
use crate::traits::{
    ChatRequest, ChatResponse, MessageKind, Provider, Reporter, ResponsePart, ToolCall,
    ToolSession, ToolSpec,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const DEFAULT_MAX_RETRIES: usize = 3;

/// Drives one query through the model, running any requested tools against
/// the session.
pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    session: Arc<dyn ToolSession>,
    reporter: Arc<dyn Reporter>,
    tools: Vec<ToolSpec>,
    max_retries: usize,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        session: Arc<dyn ToolSession>,
        reporter: Arc<dyn Reporter>,
        tools: Vec<ToolSpec>,
    ) -> Self {
        Self {
            provider,
            session,
            reporter,
            tools,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Lists the session's tools once and caches their adapted schemas for
    /// the lifetime of the loop.
    pub async fn connect(
        provider: Arc<dyn Provider>,
        session: Arc<dyn ToolSession>,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self> {
        let listed = session.list_tools().await?;
        let tools = adapt_tool_specs(&listed);
        info!("Discovered {} tools", tools.len());
        reporter.report(
            MessageKind::Info,
            &format!("Connected to server with {} tools available", tools.len()),
        );
        Ok(Self::new(provider, session, reporter, tools))
    }

    pub fn with_max_retries(mut self, max: usize) -> Self {
        self.max_retries = max;
        self
    }

    pub fn tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    pub async fn process(&self, query: &str) -> Result<String> {
        let mut conversation = Conversation::new(query);
        self.process_conversation(&mut conversation).await
    }

    /// Runs the retry loop over an existing conversation. A failed attempt
    /// leaves the conversation untouched and the next attempt reuses it.
    pub async fn process_conversation(&self, conversation: &mut Conversation) -> Result<String> {
        if self.max_retries == 0 {
            return Err(NewsdeskError::Configuration(
                "max_retries must be at least 1".to_string(),
            ));
        }

        let tools = if self.tools.is_empty() {
            None
        } else {
            Some(self.tools.as_slice())
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let request = ChatRequest {
                turns: conversation.turns(),
                tools,
            };
            debug!(
                "Inference attempt {}/{} via {}",
                attempt,
                self.max_retries,
                self.provider.name()
            );

            match self.provider.chat(request).await {
                Ok(response) => return Ok(self.handle_response(response, conversation).await),
                Err(e) if attempt >= self.max_retries => {
                    error!("Inference failed on final attempt {}: {:#}", attempt, e);
                    return Err(NewsdeskError::ExhaustedRetries {
                        attempts: attempt,
                        source: Box::new(NewsdeskError::Inference(format!("{e:#}"))),
                    });
                }
                Err(e) => {
                    warn!("Inference attempt {} failed: {:#}", attempt, e);
                    self.reporter.report(
                        MessageKind::Warning,
                        &format!("Retrying... ({}/{})", attempt, self.max_retries),
                    );
                }
            }
        }
    }

    /// Collects text parts into the answer and runs tool calls in order.
    /// Tool results are recorded but not sent back to the model.
    async fn handle_response(
        &self,
        response: ChatResponse,
        conversation: &mut Conversation,
    ) -> String {
        let mut final_text = Vec::new();

        for part in response.parts {
            match part {
                ResponsePart::Text(text) => final_text.push(text),
                ResponsePart::ToolCall(call) => {
                    if let Some(output) = self.execute_tool_call(&call).await {
                        conversation.record_tool_exchange(call, output);
                    }
                }
            }
        }

        final_text.join("\n")
    }

    /// Returns the tool output, or `None` when the call failed. Failed calls
    /// are reported and leave no trace in the conversation.
    async fn execute_tool_call(&self, call: &ToolCall) -> Option<String> {
        self.reporter.tool_call(&call.name, &call.arguments);
        info!("Calling tool {}", call.name);

        let outcome = match self.session.call_tool(&call.name, &call.arguments).await {
            Ok(result) if result.success => Ok(result.output),
            Ok(result) => Err(NewsdeskError::ToolExecution(
                result
                    .error
                    .unwrap_or_else(|| format!("{} reported an error", call.name)),
            )),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(output) => Some(output),
            Err(e) => {
                error!("Tool {} failed: {}", call.name, e);
                self.reporter
                    .report(MessageKind::Error, &format!("Tool call failed: {}", e));
                None
            }
        }
    }
}
