pub mod agent;
pub mod config;
pub mod error;
pub mod mcp;
pub mod news;
pub mod providers;
pub mod tools;
pub mod traits;

pub use agent::{AgentLoop, Conversation, ToolRegistry};
pub use config::*;
pub use error::{NewsdeskError, Result};
pub use traits::*;
