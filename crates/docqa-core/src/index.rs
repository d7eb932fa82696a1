//! Index pipeline: extract → chunk → embed → store. Builds an in-memory vector index.

use tracing::{debug, info};

use crate::chunks::{Chunk, TextSplitter};
use crate::documents::Document;
use crate::extract::{extract_text, ExtractError, RawText};
use crate::provider::{Embedder, ProviderError};
use crate::store::VectorIndex;

/// Counts reported after a successful build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub documents: usize,
    pub pages: usize,
    pub chunks: usize,
}

/// Runs the full pipeline over PDF documents and returns a fresh index.
pub async fn build_index(
    docs: &[Document],
    splitter: &TextSplitter,
    embedder: &dyn Embedder,
    batch_size: usize,
) -> Result<(VectorIndex, IndexStats), IndexError> {
    let raw = extract_text(docs)?;
    build_index_from_text(&raw, splitter, embedder, batch_size).await
}

/// Chunks and embeds already extracted text.
pub async fn build_index_from_text(
    raw: &RawText,
    splitter: &TextSplitter,
    embedder: &dyn Embedder,
    batch_size: usize,
) -> Result<(VectorIndex, IndexStats), IndexError> {
    let chunks = splitter.split_text(&raw.text);
    if chunks.is_empty() {
        return Err(IndexError::NoText);
    }
    info!(
        documents = raw.documents,
        pages = raw.pages,
        chunks = chunks.len(),
        model = embedder.embed_model(),
        "embedding chunks"
    );

    let embeddings = embed_chunks(&chunks, embedder, batch_size).await?;
    let stats = IndexStats {
        documents: raw.documents,
        pages: raw.pages,
        chunks: chunks.len(),
    };
    Ok((VectorIndex::from_embeddings(chunks, embeddings), stats))
}

/// Embeds chunk texts in batches of at most `batch_size` (0 means one batch).
async fn embed_chunks(
    chunks: &[Chunk],
    embedder: &dyn Embedder,
    batch_size: usize,
) -> Result<Vec<Vec<f32>>, IndexError> {
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let batch_size = if batch_size == 0 { texts.len() } else { batch_size };

    let mut embeddings = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size) {
        debug!(inputs = batch.len(), "embedding batch");
        let vectors = embedder.embed_batch(batch).await?;
        if vectors.len() != batch.len() {
            return Err(IndexError::EmbeddingCount {
                expected: batch.len(),
                got: vectors.len(),
            });
        }
        embeddings.extend(vectors);
    }
    Ok(embeddings)
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),
    #[error("no text could be extracted from the documents")]
    NoText,
    #[error("embedding error: {0}")]
    Provider(#[from] ProviderError),
    #[error("expected {expected} embeddings, provider returned {got}")]
    EmbeddingCount { expected: usize, got: usize },
}
