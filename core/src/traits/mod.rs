pub mod provider;
pub mod reporter;
pub mod session;
pub mod tool;

pub use provider::{ChatRequest, ChatResponse, Provider, ResponsePart, ToolCall, Turn, TurnPayload, TurnRole};
pub use reporter::{MessageKind, Reporter};
pub use session::ToolSession;
pub use tool::{Tool, ToolResult, ToolSpec};
