//! Ollama client for embeddings and chat. Wraps ollama-rs with a simple API.

use async_trait::async_trait;
use ollama_rs::generation::chat::request::ChatMessageRequest;
use ollama_rs::generation::chat::ChatMessage;
use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};
use ollama_rs::Ollama;
use tracing::debug;

use super::{ChatModel, Embedder, ProviderError};
use crate::config::{OLLAMA_CHAT_MODEL, OLLAMA_EMBED_MODEL};
use crate::transcript::{Message, Role};

/// Thin wrapper around Ollama for embedding and chat.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    inner: Ollama,
    embed_model: String,
    chat_model: String,
}

impl OllamaClient {
    /// Create from URL string, e.g. `http://localhost:11434`.
    pub fn from_url(url: &str) -> Result<Self, ProviderError> {
        let inner = Ollama::try_new(url)?;
        Ok(Self {
            inner,
            embed_model: OLLAMA_EMBED_MODEL.to_string(),
            chat_model: OLLAMA_CHAT_MODEL.to_string(),
        })
    }

    /// Set the embedding model (e.g. `nomic-embed-text`, `all-minilm`).
    pub fn with_embed_model(mut self, model: impl Into<String>) -> Self {
        self.embed_model = model.into();
        self
    }

    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }
}

#[async_trait]
impl Embedder for OllamaClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(model = %self.embed_model, inputs = texts.len(), "requesting Ollama embeddings");
        let req = GenerateEmbeddingsRequest::new(
            self.embed_model.clone(),
            EmbeddingsInput::Multiple(texts.to_vec()),
        );
        let res = self.inner.generate_embeddings(req).await?;
        Ok(res.embeddings)
    }

    fn embed_model(&self) -> &str {
        &self.embed_model
    }
}

#[async_trait]
impl ChatModel for OllamaClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, ProviderError> {
        debug!(model = %self.chat_model, messages = messages.len(), "sending Ollama chat");
        let req = ChatMessageRequest::new(
            self.chat_model.clone(),
            messages.iter().map(to_chat_message).collect(),
        );
        let res = self.inner.send_chat_messages(req).await?;
        Ok(res.message.content.trim().to_string())
    }

    fn chat_model(&self) -> &str {
        &self.chat_model
    }
}

fn to_chat_message(message: &Message) -> ChatMessage {
    let content = message.content.clone();
    match message.role {
        Role::System => ChatMessage::system(content),
        Role::User => ChatMessage::user(content),
        Role::Assistant => ChatMessage::assistant(content),
    }
}
