//! Conversation messages and the session transcript.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

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

/// User/assistant messages of one session, oldest first.
///
/// Only whole turns are stored, so messages alternate starting with the user
/// and the length is always even.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one question and its answer.
    pub fn push_turn(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.messages.push(Message::user(question));
        self.messages.push(Message::assistant(answer));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// `(question, answer)` pairs in order.
    pub fn turns(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.messages
            .chunks_exact(2)
            .map(|pair| (pair[0].content.as_str(), pair[1].content.as_str()))
    }

    pub fn last_turn(&self) -> Option<(&str, &str)> {
        self.turns().last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
