//! Chat log types — an append-only ordered sequence of messages.

use serde::{Deserialize, Serialize};

/// Opening message seeded into every fresh chat log.
pub const GREETING: &str = "Waheguru Ji Ka Khalsa, Waheguru Ji Ki Fateh. I am your companion. \
     Feel free to ask me about Sikhism, the Golden Temple, or Gurbani concepts.";

/// Starter prompts offered while the conversation is still short.
pub const INITIAL_QUESTIONS: [&str; 4] = [
    "What is the significance of Darbar Sahib?",
    "Tell me about the history of Amritsar.",
    "What is Hukamnama?",
    "Who founded the Golden Temple?",
];

/// Starter prompts are hidden once the log reaches this many entries.
pub const SUGGESTIONS_CUTOFF: usize = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Model,
}

/// One chat bubble.  Never mutated after insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    #[serde(default)]
    pub is_error: bool,
    pub at: chrono::DateTime<chrono::Local>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
            is_error: false,
            at: chrono::Local::now(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
            is_error: false,
            at: chrono::Local::now(),
        }
    }

    pub fn model_error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::model(text)
        }
    }
}

/// Ordered chat history, retained for the lifetime of the chat view.
/// Entries can only be appended; there is deliberately no mutation API.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    entries: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, msg: ChatMessage) {
        self.entries.push(msg);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent non-error assistant reply, if any.
    pub fn last_reply(&self) -> Option<&ChatMessage> {
        self.entries
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::Model && !m.is_error)
    }
}

/// True when the text carries nothing worth sending.  Whitespace-only input
/// produces no chat entry and no service call.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_detection() {
        assert!(is_blank(""));
        assert!(is_blank("   \t\n"));
        assert!(!is_blank(" hukamnama "));
    }

    #[test]
    fn last_reply_skips_error_entries() {
        let mut log = ChatLog::new();
        log.push(ChatMessage::model("welcome"));
        log.push(ChatMessage::user("question"));
        log.push(ChatMessage::model_error("fallback"));
        assert_eq!(log.last_reply().unwrap().text, "welcome");
        assert_eq!(log.len(), 3);
    }
}
