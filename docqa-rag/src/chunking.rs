//! Sliding-window document chunking.
//!
//! [`chunk`] splits text into overlapping windows measured in Unicode scalar
//! values. [`FixedSizeChunker`] applies it to whole [`Document`]s and stamps
//! per-chunk metadata.

use crate::document::{Chunk, ChunkMetadata, Document};
use crate::error::{RagError, Result};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with source and position metadata.
/// Embeddings are attached later by the retriever.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty content.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Check that a window of `chunk_size` advancing by `chunk_size - overlap`
/// makes progress.
pub fn validate_window(chunk_size: usize, overlap: usize) -> Result<()> {
    if overlap >= chunk_size {
        return Err(RagError::Validation(format!(
            "overlap ({overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Split `content` into overlapping windows of at most `chunk_size` characters.
///
/// - empty content yields no chunks
/// - content of at most `chunk_size` characters yields itself unchanged
/// - otherwise windows start at `0, step, 2 * step, ...` with
///   `step = chunk_size - overlap` until the start reaches the end of the
///   content; windows near the end are cut short, so the tail chunk may be
///   shorter than `overlap`
///
/// # Errors
///
/// Returns [`RagError::Validation`] if `overlap >= chunk_size`.
///
/// # Example
///
/// ```rust
/// let chunks = docqa_rag::chunk("abcdefghij", 4, 1).unwrap();
/// assert_eq!(chunks, vec!["abcd", "defg", "ghij", "j"]);
/// ```
pub fn chunk(content: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    validate_window(chunk_size, overlap)?;
    Ok(split_windows(content, chunk_size, overlap))
}

/// Window splitting for parameters already known to be valid.
fn split_windows(content: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if content.is_empty() {
        return Vec::new();
    }

    // Byte offset of every character boundary, including the end.
    let offsets: Vec<usize> =
        content.char_indices().map(|(i, _)| i).chain(std::iter::once(content.len())).collect();
    let char_count = offsets.len() - 1;

    if char_count <= chunk_size {
        return vec![content.to_string()];
    }

    let step = chunk_size - overlap;
    let mut chunks = Vec::with_capacity(char_count.div_ceil(step));
    let mut start = 0;

    while start < char_count {
        let end = (start + chunk_size).min(char_count);
        chunks.push(content[offsets[start]..offsets[end]].to_string());
        start += step;
    }

    chunks
}

/// Splits documents into fixed-size character windows with overlap.
///
/// Each chunk carries the parent document's `source` and `path` plus its
/// `chunk_index` and the document's `total_chunks`.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{Chunker, FixedSizeChunker};
///
/// let chunker = FixedSizeChunker::new(500, 100)?;
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` - maximum number of characters per chunk
    /// * `overlap` - number of characters shared by consecutive chunks
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Validation`] if `overlap >= chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        validate_window(chunk_size, overlap)?;
        Ok(Self { chunk_size, overlap })
    }

    /// Maximum number of characters per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of characters shared by consecutive chunks.
    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let windows = split_windows(&document.content, self.chunk_size, self.overlap);
        let total_chunks = windows.len();

        windows
            .into_iter()
            .enumerate()
            .map(|(chunk_index, content)| Chunk {
                content,
                metadata: ChunkMetadata {
                    source: document.metadata.source.clone(),
                    path: document.metadata.path.clone(),
                    chunk_index,
                    total_chunks,
                },
            })
            .collect()
    }
}

/// Chunk a single document with the given window parameters.
///
/// # Errors
///
/// Returns [`RagError::Validation`] if `overlap >= chunk_size`.
pub fn chunk_document(document: &Document, chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    Ok(FixedSizeChunker::new(chunk_size, overlap)?.chunk(document))
}
