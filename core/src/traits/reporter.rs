use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Warning,
    Error,
    ToolCall,
    Response,
}

impl MessageKind {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::ToolCall => "TOOL_CALL",
            Self::Response => "RESPONSE",
        }
    }
}

/// User-facing output sink.
pub trait Reporter: Send + Sync {
    fn report(&self, kind: MessageKind, text: &str);

    fn tool_call(&self, name: &str, args: &Map<String, Value>) {
        let args = serde_json::to_string_pretty(args).unwrap_or_else(|_| "{}".to_string());
        self.report(MessageKind::ToolCall, &format!("Calling: {name}\n{args}"));
    }
}
