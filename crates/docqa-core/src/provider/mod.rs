//! Hosted model providers: embeddings and chat.
//!
//! The pipeline only sees the [`Embedder`] and [`ChatModel`] traits. Two backends
//! implement both: an OpenAI-compatible HTTP API and Ollama.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{ProviderConfig, ProviderKind};
use crate::transcript::Message;

#[cfg(test)]
pub(crate) mod fake;
pub mod ollama;
pub mod openai;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

/// Turns text into embedding vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        if vectors.len() != 1 {
            return Err(ProviderError::InvalidResponse(format!(
                "expected 1 embedding, got {}",
                vectors.len()
            )));
        }
        Ok(vectors.remove(0))
    }

    fn embed_model(&self) -> &str;
}

/// Produces an assistant reply to a list of messages.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String, ProviderError>;

    fn chat_model(&self) -> &str;
}

/// The embedding and chat handles a session works with.
#[derive(Clone)]
pub struct Providers {
    pub embedder: Arc<dyn Embedder>,
    pub chat: Arc<dyn ChatModel>,
}

impl Providers {
    pub fn new(embedder: Arc<dyn Embedder>, chat: Arc<dyn ChatModel>) -> Self {
        Self { embedder, chat }
    }

    /// Builds the configured backend. The OpenAI backend needs `api_key`.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        match config.kind {
            ProviderKind::OpenAi => {
                let api_key = config.api_key.clone().ok_or(ProviderError::MissingApiKey)?;
                let client = Arc::new(
                    OpenAiClient::new(config.base_url(), api_key)?
                        .with_embed_model(config.embed_model())
                        .with_chat_model(config.chat_model())
                        .with_temperature(config.temperature),
                );
                Ok(Self::new(client.clone(), client))
            }
            ProviderKind::Ollama => {
                let client = Arc::new(
                    OllamaClient::from_url(config.base_url())?
                        .with_embed_model(config.embed_model())
                        .with_chat_model(config.chat_model()),
                );
                Ok(Self::new(client.clone(), client))
            }
        }
    }
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers")
            .field("embed_model", &self.embedder.embed_model())
            .field("chat_model", &self.chat.chat_model())
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("invalid provider URL: {0}")]
    ParseUrl(#[from] url::ParseError),
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Ollama request failed: {0}")]
    Ollama(#[from] ollama_rs::error::OllamaError),
    #[error("malformed provider response: {0}")]
    InvalidResponse(String),
}
