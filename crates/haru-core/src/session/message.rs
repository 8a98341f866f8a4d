//! Conversation turn types.
//!
//! A turn is one role-tagged message inside a session. Turns are immutable
//! once appended; their order in the log is the conversation order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents the author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message typed by the user.
    User,
    /// Reply produced by the worker or the fallback responder.
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single record in a session log.
///
/// Serialized as one JSON object per line: `{"role","content","timestamp"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Creates a turn stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_wire_format() {
        let turn = Turn::user("hi");
        let json = serde_json::to_value(&turn).unwrap();

        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hi");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_turn_parses_external_record() {
        let line = r#"{"role":"assistant","content":"ok","timestamp":"2024-01-01T00:00:01Z"}"#;
        let turn: Turn = serde_json::from_str(line).unwrap();
        assert_eq!(turn.role, Role::Assistant);
        assert_eq!(turn.content, "ok");
    }
}
