//! In-process providers for tests. No network.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChatModel, Embedder, ProviderError};
use crate::transcript::Message;

/// Embeds text as keyword counts: dimension `i` is how often `keywords[i]` occurs.
pub struct KeywordEmbedder {
    keywords: Vec<&'static str>,
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl KeywordEmbedder {
    pub fn new(keywords: &[&'static str]) -> Self {
        Self {
            keywords: keywords.to_vec(),
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .map(|k| lower.matches(k).count() as f32)
            .collect()
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::Status {
                status: 500,
                message: "embedding backend down".into(),
            });
        }
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn embed_model(&self) -> &str {
        "keyword-counts"
    }
}

/// Answers `answer {n}` for the n-th call and records every request.
#[derive(Default)]
pub struct ScriptedChat {
    pub requests: Mutex<Vec<Vec<Message>>>,
    pub fail: AtomicBool,
}

impl ScriptedChat {
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, i: usize) -> Vec<Message> {
        self.requests.lock().unwrap()[i].clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn complete(&self, messages: &[Message]) -> Result<String, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(messages.to_vec());
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::Status {
                status: 503,
                message: "chat backend down".into(),
            });
        }
        Ok(format!("answer {}", requests.len()))
    }

    fn chat_model(&self) -> &str {
        "scripted"
    }
}
