pub mod conversation;
pub mod loop_;
pub mod registry;
pub mod schema;

pub use conversation::Conversation;
pub use loop_::AgentLoop;
pub use registry::ToolRegistry;
pub use schema::{adapt_schema, adapt_tool_specs};
