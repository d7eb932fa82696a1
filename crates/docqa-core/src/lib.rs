//! All backend logic independent of how the app is run.
//!
//! PDFs are extracted, chunked and embedded into an in-memory index; questions are
//! answered by retrieving chunks and asking a chat model (see [session]).
//! Nothing is persisted between sessions.

pub mod app_data;
pub mod chunks;
pub mod config;
pub mod documents;
pub mod extract;
pub mod index;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod store;
pub mod transcript;

pub use app_data::default_config_path;
pub use chunks::{Chunk, ChunkError, Chunks, TextSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use config::{load_config, Config, ConfigError, ProviderKind};
pub use documents::{load_documents, Document, DocumentError};
pub use extract::{extract_text, ExtractError, RawText};
pub use index::{build_index, IndexError, IndexStats};
pub use provider::{ChatModel, Embedder, ProviderError, Providers};
pub use session::{Answer, ConversationSession, SessionError, NOT_INITIALIZED_MESSAGE};
pub use store::{ScoredChunk, VectorIndex};
pub use transcript::{Message, Role, Transcript};

/// Returns a short status string. Used to verify the backend is wired up.
pub fn status() -> &'static str {
    "docqa-core ready"
}
