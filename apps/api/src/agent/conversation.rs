use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::llm_client::ChatMessage;

/// One entry of the conversation. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ConversationTurn {
    User {
        content: String,
        at: DateTime<Utc>,
    },
    Assistant {
        content: String,
        at: DateTime<Utc>,
    },
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
            at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            at: Utc::now(),
        }
    }

    fn to_message(&self) -> ChatMessage {
        match self {
            Self::User { content, .. } => ChatMessage::User(content.clone()),
            Self::Assistant { content, .. } => ChatMessage::Assistant(content.clone()),
        }
    }
}

/// Append-only ordered log of turns. `append` is the only mutator.
///
/// The full log is retained for the session's lifetime; only the most recent
/// window is sent to the model (see `to_messages`).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ConversationContext {
    turns: Vec<ConversationTurn>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn as_history(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// The last `k` turns, in order.
    pub fn window(&self, k: usize) -> &[ConversationTurn] {
        let history = self.as_history();
        &history[history.len().saturating_sub(k)..]
    }

    /// The last `k` turns as backend chat messages. Gemini expects a
    /// multi-turn request to open with a user turn, so a leading assistant
    /// turn cut in half by the window is dropped.
    pub fn to_messages(&self, k: usize) -> Vec<ChatMessage> {
        self.window(k)
            .iter()
            .skip_while(|turn| matches!(turn, ConversationTurn::Assistant { .. }))
            .map(ConversationTurn::to_message)
            .collect()
    }
}

#[cfg(test)]
impl ConversationTurn {
    pub fn content(&self) -> &str {
        match self {
            Self::User { content, .. } | Self::Assistant { content, .. } => content,
        }
    }
}
