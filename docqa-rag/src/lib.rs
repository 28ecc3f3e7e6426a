//! # docqa-rag
//!
//! Retrieval-augmented question answering over plain-text documents.
//!
//! Documents are split into overlapping character windows, embedded, and
//! stored as points in a vector collection. Questions are embedded, matched
//! against the collection, and the top chunks are assembled into a bounded
//! context for a language model.
//!
//! ## Components
//!
//! - [`chunk`] / [`FixedSizeChunker`] - sliding-window chunking
//! - [`load_documents`] / [`process_documents`] - directory loading
//! - [`EmbeddingProvider`] - text → vector backends
//! - [`VectorStore`] - collection storage and nearest-neighbor queries
//! - [`Retriever`] - dimension-checked store and search over one collection
//! - [`build_context`] - first-fit context assembly
//! - [`Answerer`] - prompt → answer backends
//! - [`RagPipeline`] - ingestion and question answering end to end
//!
//! ## Backends
//!
//! | feature  | contents |
//! |----------|----------|
//! | `openai` (default) | [`openai::OpenAIEmbeddingProvider`], [`openai::OpenAIChatAnswerer`] |
//! | `qdrant` | [`qdrant::QdrantVectorStore`] |
//!
//! [`InMemoryVectorStore`] is always available.

pub mod answer;
pub mod chunking;
pub mod config;
pub mod context;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod loader;
pub mod pipeline;
pub mod retriever;
pub mod vectorstore;

#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use answer::{Answer, Answerer, NO_ANSWER, build_prompt};
pub use chunking::{Chunker, FixedSizeChunker, chunk, chunk_document};
pub use config::{RagConfig, RagConfigBuilder, ServiceConfig, Settings};
pub use context::build_context;
pub use document::{
    Chunk, ChunkMetadata, Document, DocumentMetadata, EmbeddedChunk, Payload, Point, PointId,
    SearchResult,
};
pub use embedding::{EmbeddingProvider, embed_in_batches};
pub use error::{ErrorKind, RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use loader::{load_documents, process_documents};
pub use pipeline::{IngestReport, RagPipeline, RagPipelineBuilder};
pub use retriever::Retriever;
pub use vectorstore::{CollectionConfig, Distance, VectorStore};
