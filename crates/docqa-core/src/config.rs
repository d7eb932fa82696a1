//! Runtime configuration: providers, chunking and retrieval settings.
//!
//! Loaded from defaults, then an optional TOML file, then environment variables.
//! Credentials are only ever taken from the environment.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::app_data;
use crate::chunks::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_SEPARATOR};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_EMBED_MODEL: &str = "text-embedding-3-large";
pub const OPENAI_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const OLLAMA_EMBED_MODEL: &str = "nomic-embed-text";
pub const OLLAMA_CHAT_MODEL: &str = "llama3.2";

/// Default number of chunks handed to the chat model per question.
pub const DEFAULT_TOP_K: usize = 4;
/// Most inputs sent in one embedding request.
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
}

/// Which backend serves embeddings and chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI or any API compatible with its `/embeddings` and `/chat/completions`.
    #[default]
    OpenAi,
    Ollama,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(format!("unknown provider `{other}` (expected openai or ollama)")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Overrides the per-provider default base URL.
    pub base_url: Option<String>,
    pub embed_model: Option<String>,
    pub chat_model: Option<String>,
    pub temperature: f32,
    pub embed_batch_size: usize,
    /// From `OPENAI_API_KEY` only.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            base_url: None,
            embed_model: None,
            chat_model: None,
            temperature: 0.7,
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
            api_key: None,
        }
    }
}

impl ProviderConfig {
    pub fn base_url(&self) -> &str {
        match (&self.base_url, self.kind) {
            (Some(url), _) => url,
            (None, ProviderKind::OpenAi) => OPENAI_BASE_URL,
            (None, ProviderKind::Ollama) => OLLAMA_BASE_URL,
        }
    }

    pub fn embed_model(&self) -> &str {
        match (&self.embed_model, self.kind) {
            (Some(model), _) => model,
            (None, ProviderKind::OpenAi) => OPENAI_EMBED_MODEL,
            (None, ProviderKind::Ollama) => OLLAMA_EMBED_MODEL,
        }
    }

    pub fn chat_model(&self) -> &str {
        match (&self.chat_model, self.kind) {
            (Some(model), _) => model,
            (None, ProviderKind::OpenAi) => OPENAI_CHAT_MODEL,
            (None, ProviderKind::Ollama) => OLLAMA_CHAT_MODEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub separator: String,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Rewrite follow-up questions into standalone ones before retrieval.
    pub condense_question: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            condense_question: true,
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Parse)
    }

    /// Applies `DOCQA_*` overrides and `OPENAI_API_KEY` from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::apply_env`] with a custom variable lookup.
    pub fn apply_env_with(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("DOCQA_PROVIDER") {
            self.provider.kind = v.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "DOCQA_PROVIDER",
                value: v.clone(),
            })?;
        }
        if let Some(v) = var("DOCQA_BASE_URL") {
            self.provider.base_url = Some(v);
        }
        if let Some(v) = var("DOCQA_EMBED_MODEL") {
            self.provider.embed_model = Some(v);
        }
        if let Some(v) = var("DOCQA_CHAT_MODEL") {
            self.provider.chat_model = Some(v);
        }
        if let Some(v) = var("DOCQA_TOP_K") {
            self.retrieval.top_k = v.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: "DOCQA_TOP_K",
                value: v.clone(),
            })?;
        }
        self.provider.api_key = var("OPENAI_API_KEY");
        Ok(())
    }
}

/// Load config: defaults, then a TOML file, then the environment.
///
/// An explicit `path` must exist and parse. Without one, `config.toml` in the
/// platform config directory is used if present.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => match app_data::default_config_path().filter(|p| p.is_file()) {
            Some(default_path) => read_config_file(&default_path)?,
            None => Config::default(),
        },
    };
    config.apply_env()?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    Config::from_toml_str(&s)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(toml::de::Error),
    #[error("invalid value for {var}: `{value}`")]
    InvalidEnv { var: &'static str, value: String },
}
