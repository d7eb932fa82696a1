//! Prompt templates for the question condensing and answering calls.

use crate::store::ScoredChunk;
use crate::transcript::{Message, Role};

const ANSWER_SYSTEM_PROMPT: &str = "Use the following pieces of context to answer the user's question. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.";

const CONDENSE_PROMPT: &str = "Given the following conversation and a follow up question, \
rephrase the follow up question to be a standalone question, in its original language.";

/// System message with the retrieved context, then the prior transcript, then the question.
pub fn answer_messages(sources: &[ScoredChunk], history: &[Message], question: &str) -> Vec<Message> {
    let context = sources
        .iter()
        .map(|s| s.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(format!(
        "{ANSWER_SYSTEM_PROMPT}\n----------------\n{context}"
    )));
    messages.extend_from_slice(history);
    messages.push(Message::user(question));
    messages
}

/// A single user message asking the model to make `question` self-contained.
pub fn condense_messages(history: &[Message], question: &str) -> Vec<Message> {
    let chat_history = history
        .iter()
        .map(|m| match m.role {
            Role::User => format!("Human: {}", m.content),
            Role::Assistant => format!("Assistant: {}", m.content),
            Role::System => format!("System: {}", m.content),
        })
        .collect::<Vec<_>>()
        .join("\n");
    vec![Message::user(format!(
        "{CONDENSE_PROMPT}\n\nChat History:\n{chat_history}\nFollow Up Input: {question}\nStandalone question:"
    ))]
}
