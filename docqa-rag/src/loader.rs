//! Loading plain-text documents from a directory.

use std::path::Path;

use tracing::{debug, info};

use crate::chunking::{Chunker, FixedSizeChunker};
use crate::document::{Chunk, Document, DocumentMetadata};
use crate::error::{RagError, Result};

/// Extension of the files treated as documents.
const DOCUMENT_EXTENSION: &str = "txt";

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> RagError {
    let path = path.to_path_buf();
    move |source| RagError::Io { path, source }
}

/// Load every `.txt` file directly under `dir` as a [`Document`].
///
/// The document `source` is the file name and `path` the full path.
/// Documents are sorted by file name. Subdirectories are not descended into.
///
/// # Errors
///
/// Returns [`RagError::Io`] if the directory cannot be listed or a file
/// cannot be read as UTF-8.
pub fn load_documents(dir: impl AsRef<Path>) -> Result<Vec<Document>> {
    let dir = dir.as_ref();

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error(dir))? {
        let path = entry.map_err(io_error(dir))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == DOCUMENT_EXTENSION) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let content = std::fs::read_to_string(&path).map_err(io_error(&path))?;
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!(source = %source, chars = content.chars().count(), "loaded document");
        documents.push(Document {
            content,
            metadata: DocumentMetadata { source, path: path.display().to_string() },
        });
    }

    info!(dir = %dir.display(), document_count = documents.len(), "loaded documents");
    Ok(documents)
}

/// Load the documents under `dir` and split each into chunks.
///
/// # Errors
///
/// Returns [`RagError::Validation`] for invalid window parameters (checked
/// before touching the filesystem) and [`RagError::Io`] for read failures.
pub fn process_documents(
    dir: impl AsRef<Path>,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<Chunk>> {
    let chunker = FixedSizeChunker::new(chunk_size, overlap)?;
    let documents = load_documents(dir)?;
    let chunks: Vec<Chunk> = documents.iter().flat_map(|doc| chunker.chunk(doc)).collect();
    info!(document_count = documents.len(), chunk_count = chunks.len(), "processed documents");
    Ok(chunks)
}
