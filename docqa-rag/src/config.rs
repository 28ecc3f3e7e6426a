//! Configuration for the RAG pipeline and its external services.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chunking::validate_window;
use crate::error::{RagError, Result};
use crate::vectorstore::{CollectionConfig, Distance};

/// Default OpenAI-compatible API base URL.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration parameters for chunking, retrieval, and context assembly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of top results to return from vector search.
    pub top_k: usize,
    /// Maximum length of the assembled context, in characters.
    pub max_context_length: usize,
    /// Maximum number of texts sent to the embedder in one request.
    pub embedding_batch_size: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
            top_k: 5,
            max_context_length: 3000,
            embedding_batch_size: 100,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `embedding_batch_size == 0`
    pub fn validate(&self) -> Result<()> {
        validate_window(self.chunk_size, self.chunk_overlap)
            .map_err(|e| RagError::ConfigError(e.to_string()))?;
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.embedding_batch_size == 0 {
            return Err(RagError::ConfigError(
                "embedding_batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of top results to return from vector search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the maximum context length in characters.
    pub fn max_context_length(mut self, length: usize) -> Self {
        self.config.max_context_length = length;
        self
    }

    /// Set the embedder batch size.
    pub fn embedding_batch_size(mut self, size: usize) -> Self {
        self.config.embedding_batch_size = size;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Endpoints and model settings for the external services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    /// gRPC URL of the Qdrant server.
    pub qdrant_url: String,
    /// Base URL of the OpenAI-compatible API.
    pub openai_base_url: String,
    /// Embedding model id.
    pub embedding_model: String,
    /// Chat model id used for answers.
    pub chat_model: String,
    /// Sampling temperature for answers.
    pub temperature: f32,
    /// Upper bound on every external call, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            qdrant_url: "http://localhost:6334".to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            request_timeout_secs: 30,
        }
    }
}

impl ServiceConfig {
    /// The per-call timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Complete settings: pipeline parameters, collection, and services.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Chunking and retrieval parameters.
    pub rag: RagConfig,
    /// The target collection.
    pub collection: CollectionConfig,
    /// External service endpoints and models.
    pub services: ServiceConfig,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// | variable | default |
    /// |---|---|
    /// | `QDRANT_URL` | built from `QDRANT_HOST` / `QDRANT_PORT` |
    /// | `QDRANT_HOST` | `localhost` |
    /// | `QDRANT_PORT` | `6334` |
    /// | `OPENAI_BASE_URL` | `https://api.openai.com/v1` |
    /// | `DOCQA_COLLECTION` | `documents` |
    /// | `DOCQA_VECTOR_SIZE` | `1536` |
    /// | `DOCQA_DISTANCE` | `cosine` |
    /// | `DOCQA_EMBEDDING_MODEL` | `text-embedding-3-small` |
    /// | `DOCQA_CHAT_MODEL` | `gpt-4o-mini` |
    /// | `DOCQA_TEMPERATURE` | `0.3` |
    /// | `DOCQA_CHUNK_SIZE` | `500` |
    /// | `DOCQA_CHUNK_OVERLAP` | `100` |
    /// | `DOCQA_TOP_K` | `5` |
    /// | `DOCQA_MAX_CONTEXT_LENGTH` | `3000` |
    /// | `DOCQA_EMBEDDING_BATCH_SIZE` | `100` |
    /// | `DOCQA_REQUEST_TIMEOUT_SECS` | `30` |
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] naming the variable if a value does
    /// not parse or the resulting parameters are inconsistent.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Settings::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let rag = RagConfig {
            chunk_size: parse_var(&get, "DOCQA_CHUNK_SIZE", defaults.rag.chunk_size)?,
            chunk_overlap: parse_var(&get, "DOCQA_CHUNK_OVERLAP", defaults.rag.chunk_overlap)?,
            top_k: parse_var(&get, "DOCQA_TOP_K", defaults.rag.top_k)?,
            max_context_length: parse_var(
                &get,
                "DOCQA_MAX_CONTEXT_LENGTH",
                defaults.rag.max_context_length,
            )?,
            embedding_batch_size: parse_var(
                &get,
                "DOCQA_EMBEDDING_BATCH_SIZE",
                defaults.rag.embedding_batch_size,
            )?,
        };
        rag.validate()?;

        let collection = CollectionConfig {
            name: get("DOCQA_COLLECTION").unwrap_or(defaults.collection.name),
            dimensions: parse_var(&get, "DOCQA_VECTOR_SIZE", defaults.collection.dimensions)?,
            distance: parse_var::<Distance>(&get, "DOCQA_DISTANCE", defaults.collection.distance)?,
        };
        if collection.dimensions == 0 {
            return Err(RagError::ConfigError("DOCQA_VECTOR_SIZE must be greater than zero".into()));
        }

        let qdrant_url = match get("QDRANT_URL") {
            Some(url) => url,
            None => {
                let host = get("QDRANT_HOST").unwrap_or_else(|| "localhost".to_string());
                let port: u16 = parse_var(&get, "QDRANT_PORT", 6334)?;
                format!("http://{host}:{port}")
            }
        };

        let services = ServiceConfig {
            qdrant_url,
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.services.openai_base_url),
            embedding_model: get("DOCQA_EMBEDDING_MODEL")
                .unwrap_or(defaults.services.embedding_model),
            chat_model: get("DOCQA_CHAT_MODEL").unwrap_or(defaults.services.chat_model),
            temperature: parse_var(&get, "DOCQA_TEMPERATURE", defaults.services.temperature)?,
            request_timeout_secs: parse_var(
                &get,
                "DOCQA_REQUEST_TIMEOUT_SECS",
                defaults.services.request_timeout_secs,
            )?,
        };

        Ok(Self { rag, collection, services })
    }
}

/// Parse `key` via `get`, falling back to `default` when unset.
fn parse_var<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| RagError::ConfigError(format!("invalid value '{raw}' for {key}: {e}"))),
    }
}
