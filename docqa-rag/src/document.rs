//! Data types for documents, chunks, vector-store points, and search results.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a [`Document`] was loaded from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// File name of the source document, e.g. `ml_basics.txt`.
    pub source: String,
    /// Full path the document was read from.
    pub path: String,
}

/// A source document: the full text of one file plus where it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// The text content of the document.
    pub content: String,
    /// Source information carried onto every chunk.
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Create a document from its content and source name.
    ///
    /// The `path` defaults to the source name; loaders set the real path.
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        Self { content: content.into(), metadata: DocumentMetadata { path: source.clone(), source } }
    }
}

/// Metadata stamped on each [`Chunk`] and persisted in the point payload.
///
/// Every field defaults when absent so payloads written by other tools
/// still deserialize.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkMetadata {
    /// File name of the parent document.
    pub source: String,
    /// Full path of the parent document.
    pub path: String,
    /// 0-based position of the chunk within its document.
    pub chunk_index: usize,
    /// Number of chunks produced from the parent document.
    pub total_chunks: usize,
}

impl ChunkMetadata {
    /// The source to display for this chunk, `Unknown` when empty.
    pub fn source_or_unknown(&self) -> &str {
        if self.source.is_empty() { "Unknown" } else { &self.source }
    }
}

/// A bounded-length window of a [`Document`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// The text content of the chunk.
    pub content: String,
    /// Source and position of the chunk.
    pub metadata: ChunkMetadata,
}

/// A [`Chunk`] with its vector embedding attached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedChunk {
    /// The chunk that was embedded.
    pub chunk: Chunk,
    /// The embedding of the chunk's content.
    pub embedding: Vec<f32>,
}

/// Namespace for deterministic point ids (UUIDv5 of the chunk identity).
const POINT_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2b7e_93a4_4d0b_8e55_1a9f_0c3d_7e21);

impl EmbeddedChunk {
    /// Derive a stable point id from the chunk's source, index, and content.
    ///
    /// Re-ingesting the same chunk yields the same id, so upserts overwrite
    /// instead of duplicating, while distinct chunks never collide.
    pub fn point_id(&self) -> PointId {
        let meta = &self.chunk.metadata;
        let key = format!("{}\u{0}{}\u{0}{}", meta.source, meta.chunk_index, self.chunk.content);
        PointId::Uuid(Uuid::new_v5(&POINT_ID_NAMESPACE, key.as_bytes()).to_string())
    }

    /// Convert into a vector-store point.
    pub fn into_point(self) -> Point {
        let id = self.point_id();
        Point {
            id,
            vector: self.embedding,
            payload: Payload { content: self.chunk.content, metadata: self.chunk.metadata },
        }
    }
}

/// Identifier of a [`Point`], unique within a collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(untagged)]
pub enum PointId {
    /// Numeric id.
    Num(u64),
    /// UUID id in its hyphenated string form.
    Uuid(String),
}

impl std::fmt::Display for PointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Uuid(s) => f.write_str(s),
        }
    }
}

/// Payload persisted alongside a point's vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payload {
    /// The chunk text.
    pub content: String,
    /// The chunk metadata.
    pub metadata: ChunkMetadata,
}

/// One vector-store record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Point {
    /// Unique id within the collection.
    pub id: PointId,
    /// The embedding vector; its length equals the collection dimension.
    pub vector: Vec<f32>,
    /// Content and metadata of the stored chunk.
    pub payload: Payload,
}

/// A stored chunk matched by a similarity query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The stored chunk text.
    pub content: String,
    /// The stored chunk metadata.
    pub metadata: ChunkMetadata,
    /// Similarity under the collection's distance metric (higher is more similar).
    pub score: f32,
}

impl SearchResult {
    /// Build a result from a matched payload and its score.
    pub fn from_payload(payload: Payload, score: f32) -> Self {
        Self { content: payload.content, metadata: payload.metadata, score }
    }
}
