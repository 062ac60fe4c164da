use crate::traits::{ToolCall, Turn, TurnPayload, TurnRole};

/// Ordered history for a single query.
///
/// Tool requests only enter the history together with their result, so a
/// `ToolRequest` turn is always directly followed by the matching `ToolResult`.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::user(query)],
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn record_tool_exchange(&mut self, call: ToolCall, content: impl Into<String>) {
        let result = Turn::tool_result(&call, content);
        self.turns.push(Turn::tool_request(call));
        self.turns.push(result);
    }

    /// True when every tool request is immediately answered by a result for
    /// the same call id.
    pub fn is_well_formed(&self) -> bool {
        let mut iter = self.turns.iter().peekable();
        while let Some(turn) = iter.next() {
            match (&turn.role, &turn.payload) {
                (TurnRole::ToolRequest, TurnPayload::ToolRequest(call)) => match iter.next() {
                    Some(Turn {
                        role: TurnRole::ToolResult,
                        payload: TurnPayload::ToolResult { call_id, .. },
                    }) if *call_id == call.id => {}
                    _ => return false,
                },
                (TurnRole::ToolResult, _) => return false,
                _ => {}
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn call(id: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: "fetch_crypto_news".to_string(),
            arguments: Map::new(),
        }
    }

    #[test]
    fn starts_with_single_user_turn() {
        let conversation = Conversation::new("bitcoin news");
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.turns()[0], Turn::user("bitcoin news"));
        assert!(conversation.is_well_formed());
    }

    #[test]
    fn tool_exchange_is_recorded_as_pair() {
        let mut conversation = Conversation::new("q");
        conversation.record_tool_exchange(call("call_1"), "ok");
        conversation.record_tool_exchange(call("call_2"), "ok");

        let roles: Vec<TurnRole> = conversation.turns().iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![
                TurnRole::User,
                TurnRole::ToolRequest,
                TurnRole::ToolResult,
                TurnRole::ToolRequest,
                TurnRole::ToolResult,
            ]
        );
        assert!(conversation.is_well_formed());
    }

    #[test]
    fn detects_orphan_request() {
        let conversation = Conversation {
            turns: vec![Turn::user("q"), Turn::tool_request(call("call_1"))],
        };
        assert!(!conversation.is_well_formed());
    }

    #[test]
    fn detects_mismatched_result() {
        let conversation = Conversation {
            turns: vec![
                Turn::user("q"),
                Turn::tool_request(call("call_1")),
                Turn::tool_result(&call("call_2"), "x"),
            ],
        };
        assert!(!conversation.is_well_formed());
    }
}
