// Messages exchanged with the LLM layer.

use serde::{Deserialize, Serialize};

/// Events emitted while a completion streams in.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmEvent {
    /// One text delta.
    Token { text: String },
    /// Stream finished; `full_text` is every token concatenated.
    Complete {
        full_text: String,
        input_tokens: u32,
        output_tokens: u32,
    },
    Error { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One prior turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A fully assembled request: system prompt, prior turns, and the new user
/// message.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub history: Vec<ChatMessage>,
    pub user: String,
    pub max_tokens: u32,
}

impl Prompt {
    pub fn new(system: String, user: String, max_tokens: u32) -> Self {
        Self {
            system,
            history: Vec::new(),
            user,
            max_tokens,
        }
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }
}

/// Final text of a finished stream plus token usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}
