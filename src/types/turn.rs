use serde::{Deserialize, Serialize};

/// Role of a turn in a conversation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// User role.
    User,

    /// Assistant role.
    Assistant,
}

/// One message in a conversation.
///
/// Turns are immutable once appended to a [`Conversation`]: they are
/// created when a request is submitted (user turn) or when it resolves,
/// fails, or is cancelled (assistant turn), and never mutated afterward.
///
/// [`Conversation`]: crate::types::Conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// The role of the turn.
    pub role: TurnRole,

    /// The formatted text content of the turn.
    pub content: String,

    /// Wall-clock seconds the engine spent producing this reply.
    ///
    /// Only present on assistant turns that completed a request. This is
    /// display metadata; it is never sent back to the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<f64>,
}

impl Turn {
    /// Create a new user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            elapsed_seconds: None,
        }
    }

    /// Create a new assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            elapsed_seconds: None,
        }
    }

    /// Create a new assistant turn that completed a request, carrying the
    /// engine-reported duration.
    pub fn assistant_timed(content: impl Into<String>, elapsed_seconds: f64) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            elapsed_seconds: Some(elapsed_seconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn user_turn_serializes_without_duration() {
        let turn = Turn::user("list files");
        let json = to_value(&turn).unwrap();
        assert_eq!(
            json,
            json!({
                "role": "user",
                "content": "list files"
            })
        );
    }

    #[test]
    fn timed_assistant_turn_keeps_duration() {
        let turn = Turn::assistant_timed("done", 1.2);
        assert_eq!(turn.role, TurnRole::Assistant);
        assert_eq!(turn.elapsed_seconds, Some(1.2));
        let json = to_value(&turn).unwrap();
        assert_eq!(
            json,
            json!({
                "role": "assistant",
                "content": "done",
                "elapsed_seconds": 1.2
            })
        );
    }

    #[test]
    fn turn_deserialization_tolerates_missing_duration() {
        let turn: Turn = serde_json::from_value(json!({
            "role": "assistant",
            "content": "hello"
        }))
        .unwrap();
        assert_eq!(turn.elapsed_seconds, None);
    }
}
