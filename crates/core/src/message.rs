//! Message and conversation-key domain types.
//!
//! These are the core value objects that flow through the entire system:
//! a Slack event becomes a user `Message`, the store trims and returns the
//! history, the orchestrator appends tool and assistant messages.

use serde::{Deserialize, Serialize};

/// Opaque key identifying one thread of chat history.
///
/// The Slack bridge derives it as `"{channel_id}_{thread_ts_or_ts}"`; the
/// core treats it as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (user profile, rules)
    System,
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// Tool execution result
    Tool,
}

/// A single message in a conversation.
///
/// `token_count` is computed once, at write time, by the store's fixed
/// tokenizer. It is never recomputed on read; a record persisted before this
/// system existed may lack the field and deserializes to 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// Tool name, set when `role == Tool`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The text content
    pub content: String,

    /// Token count of `content`, set by the store on write
    #[serde(default)]
    pub token_count: u32,
}

impl Message {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            name: None,
            content: content.into(),
            token_count: 0,
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            name: None,
            content: content.into(),
            token_count: 0,
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            name: None,
            content: content.into(),
            token_count: 0,
        }
    }

    /// Create a tool result message carrying the tool's name.
    pub fn tool(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            name: Some(name.into()),
            content: content.into(),
            token_count: 0,
        }
    }
}

/// Total token count over a message slice.
pub fn total_tokens(messages: &[Message]) -> u64 {
    messages.iter().map(|m| m.token_count as u64).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello!");
        assert!(msg.name.is_none());
        assert_eq!(msg.token_count, 0);
    }

    #[test]
    fn tool_message_carries_name() {
        let msg = Message::tool("search", "sunny");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.name.as_deref(), Some("search"));
        assert_eq!(msg.content, "sunny");
    }

    #[test]
    fn serialization_roundtrip_preserves_token_count() {
        let mut msg = Message::user("Test message");
        msg.token_count = 42;
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
        assert_eq!(back.token_count, 42);
    }

    #[test]
    fn missing_token_count_defaults_to_zero() {
        let back: Message =
            serde_json::from_str(r#"{"role":"user","content":"legacy record"}"#).unwrap();
        assert_eq!(back.token_count, 0);
        assert_eq!(back.content, "legacy record");
    }

    #[test]
    fn total_tokens_sums_counts() {
        let mut a = Message::user("a");
        a.token_count = 3;
        let mut b = Message::assistant("b");
        b.token_count = 7;
        assert_eq!(total_tokens(&[a, b]), 10);
    }
}
