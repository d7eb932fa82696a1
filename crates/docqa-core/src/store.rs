//! In-memory vector index over chunk embeddings. Supports batch build and similarity search.
//! No persistence; the index is discarded when the session ends or documents are reprocessed.

use serde::Serialize;

use crate::chunks::Chunk;

/// A chunk with its embedding, stored for similarity search.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub chunk: Chunk,
    /// Normalized embedding vector (unit length for cosine similarity via dot product).
    embedding: Vec<f32>,
}

/// A search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Cosine similarity to the query, in [-1, 1].
    pub score: f32,
}

/// In-memory vector index. Holds chunks and their embeddings; supports similarity search.
#[derive(Debug, Default)]
pub struct VectorIndex {
    items: Vec<IndexedChunk>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add a chunk with its embedding. Embedding is normalized before storage.
    pub fn add(&mut self, chunk: Chunk, embedding: Vec<f32>) {
        let norm = normalize(&embedding);
        self.items.push(IndexedChunk {
            chunk,
            embedding: norm,
        });
    }

    /// Builds an index from chunks and their embeddings, pairwise.
    /// Callers must pass the same number of each; extra items on either side are dropped.
    pub fn from_embeddings(chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Self {
        let mut index = Self::new();
        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            index.add(chunk, embedding);
        }
        index
    }

    /// Search for chunks most similar to the query embedding. Returns up to k results,
    /// best first. Ties keep index order.
    pub fn search(&self, query_embedding: &[f32], k: usize) -> Vec<ScoredChunk> {
        if self.items.is_empty() || query_embedding.is_empty() || k == 0 {
            return Vec::new();
        }
        let q_norm = normalize(query_embedding);
        let mut scored: Vec<ScoredChunk> = self
            .items
            .iter()
            .map(|ic| ScoredChunk {
                chunk: ic.chunk.clone(),
                score: dot(&q_norm, &ic.embedding),
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> + '_ {
        self.items.iter().map(|ic| &ic.chunk)
    }
}

fn normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm <= 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / norm).collect()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
