//! The conversation session: current index, transcript and the question/answer cycle.
//!
//! A session starts uninitialized. [`ConversationSession::process`] builds an index
//! and makes it ready; [`ConversationSession::ask`] then answers questions against it.

use serde::Serialize;
use tracing::{info, warn};

use crate::chunks::{ChunkError, TextSplitter};
use crate::config::{Config, RetrievalConfig};
use crate::documents::Document;
use crate::extract::RawText;
use crate::index::{build_index, build_index_from_text, IndexError, IndexStats};
use crate::prompt;
use crate::provider::{ProviderError, Providers};
use crate::store::{ScoredChunk, VectorIndex};
use crate::transcript::Transcript;

/// Shown when a question arrives before any documents were processed.
pub const NOT_INITIALIZED_MESSAGE: &str =
    "Conversation is not initialized. Process some documents first.";

/// One answered question.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub question: String,
    /// The rewritten question used for retrieval, when condensing ran.
    pub standalone_question: Option<String>,
    pub answer: String,
    pub sources: Vec<ScoredChunk>,
}

#[derive(Debug)]
pub struct ConversationSession {
    index: Option<VectorIndex>,
    transcript: Transcript,
    splitter: TextSplitter,
    retrieval: RetrievalConfig,
    embed_batch_size: usize,
    providers: Providers,
}

impl ConversationSession {
    /// A new, uninitialized session. Fails only on an invalid chunking config.
    pub fn new(config: &Config, providers: Providers) -> Result<Self, SessionError> {
        Ok(Self {
            index: None,
            transcript: Transcript::new(),
            splitter: TextSplitter::from_config(&config.chunking)?,
            retrieval: config.retrieval.clone(),
            embed_batch_size: config.provider.embed_batch_size,
            providers,
        })
    }

    pub fn is_ready(&self) -> bool {
        self.index.is_some()
    }

    pub fn index(&self) -> Option<&VectorIndex> {
        self.index.as_ref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Extracts, chunks and embeds `docs`, then replaces the current index.
    ///
    /// Every successful call rebuilds from scratch: documents from earlier calls
    /// are dropped, never merged. The transcript is kept. On failure the previous
    /// index (or its absence) is left as it was.
    pub async fn process(&mut self, docs: &[Document]) -> Result<IndexStats, SessionError> {
        let (index, stats) = build_index(
            docs,
            &self.splitter,
            self.providers.embedder.as_ref(),
            self.embed_batch_size,
        )
        .await?;
        Ok(self.install(index, stats))
    }

    /// Like [`ConversationSession::process`] for text that is already extracted.
    pub async fn process_text(&mut self, raw: &RawText) -> Result<IndexStats, SessionError> {
        let (index, stats) = build_index_from_text(
            raw,
            &self.splitter,
            self.providers.embedder.as_ref(),
            self.embed_batch_size,
        )
        .await?;
        Ok(self.install(index, stats))
    }

    fn install(&mut self, index: VectorIndex, stats: IndexStats) -> IndexStats {
        if self.index.is_some() {
            info!("replacing previous index");
        }
        self.index = Some(index);
        info!(documents = stats.documents, chunks = stats.chunks, "session ready");
        stats
    }

    /// Answers `question` from the current index and records the turn.
    ///
    /// The question and answer are appended together once the answer arrives.
    /// If any provider call fails the transcript is left unchanged.
    pub async fn ask(&mut self, question: &str) -> Result<Answer, SessionError> {
        let Some(index) = self.index.as_ref() else {
            return Err(SessionError::NotInitialized);
        };
        let question = question.trim();
        if question.is_empty() {
            return Err(SessionError::EmptyQuestion);
        }

        let answer = match self.answer(index, question).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "turn failed; transcript unchanged");
                return Err(e.into());
            }
        };
        self.transcript.push_turn(question, answer.answer.clone());
        Ok(answer)
    }

    async fn answer(&self, index: &VectorIndex, question: &str) -> Result<Answer, ProviderError> {
        let history = self.transcript.messages();

        let standalone_question = if self.retrieval.condense_question && !history.is_empty() {
            let rewritten = self
                .providers
                .chat
                .complete(&prompt::condense_messages(history, question))
                .await?;
            Some(rewritten)
        } else {
            None
        };
        let query = standalone_question.as_deref().unwrap_or(question);

        let query_embedding = self.providers.embedder.embed(query).await?;
        let sources = index.search(&query_embedding, self.retrieval.top_k);

        let messages = prompt::answer_messages(&sources, history, question);
        let answer = self.providers.chat.complete(&messages).await?;
        info!(sources = sources.len(), history = history.len(), "answered question");

        Ok(Answer {
            question: question.to_string(),
            standalone_question,
            answer,
            sources,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{}", NOT_INITIALIZED_MESSAGE)]
    NotInitialized,
    #[error("question is empty")]
    EmptyQuestion,
    #[error(transparent)]
    Chunk(#[from] ChunkError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}
