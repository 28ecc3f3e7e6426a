//! Deterministic test doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docqa_rag::{
    Answerer, ChunkMetadata, CollectionConfig, EmbeddedChunk, EmbeddingProvider,
    InMemoryVectorStore, Point, Result, SearchResult, VectorStore,
};
use docqa_rag::document::Chunk;

/// Vocabulary of [`KeywordEmbedder`]; one dimension per word.
pub const VOCABULARY: [&str; 8] =
    ["machine", "learning", "deep", "neural", "cooking", "pasta", "data", "water"];

/// Embeds text as a bag of vocabulary words, so similarity follows shared keywords.
pub struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; VOCABULARY.len()];
        for word in text.split(|c: char| !c.is_alphanumeric()) {
            let word = word.to_lowercase();
            if let Some(i) = VOCABULARY.iter().position(|w| *w == word) {
                v[i] += 1.0;
            }
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        VOCABULARY.len()
    }
}

/// Deterministic hash-based embeddings with a direction that depends on the content.
pub struct HashEmbedder {
    pub dimensions: usize,
    pub batch_calls: AtomicUsize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, batch_calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut emb = vec![0.0f32; self.dimensions];
        for (i, v) in emb.iter_mut().enumerate() {
            *v = ((hash.wrapping_add(i as u64)) as f32).sin();
        }
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            emb.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(emb)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Answers by echoing how many source blocks the prompt contained, and
/// records every prompt it receives.
#[derive(Default)]
pub struct RecordingAnswerer {
    pub prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl Answerer for RecordingAnswerer {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(format!("answer from {} source(s)", prompt.matches("[Source ").count()))
    }
}

/// An [`InMemoryVectorStore`] that counts upsert calls.
#[derive(Default)]
pub struct CountingStore {
    pub inner: InMemoryVectorStore,
    pub upserts: AtomicUsize,
    pub creates: AtomicUsize,
}

impl CountingStore {
    pub fn upsert_calls(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorStore for CountingStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        self.inner.collection_exists(name).await
    }

    async fn create_collection(&self, config: &CollectionConfig) -> Result<()> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create_collection(config).await
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.inner.delete_collection(name).await
    }

    async fn upsert(&self, collection: &str, points: &[Point]) -> Result<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert(collection, points).await
    }

    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        self.inner.query(collection, vector, limit).await
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        self.inner.count(collection).await
    }
}

/// An embedded chunk from `source` at `index` with the given vector.
pub fn embedded(source: &str, index: usize, content: &str, embedding: Vec<f32>) -> EmbeddedChunk {
    EmbeddedChunk {
        chunk: Chunk {
            content: content.to_string(),
            metadata: ChunkMetadata {
                source: source.to_string(),
                path: format!("data/{source}"),
                chunk_index: index,
                total_chunks: index + 1,
            },
        },
        embedding,
    }
}

/// A `dim`-long vector starting with `prefix` and padded with zeros.
pub fn padded(prefix: &[f32], dim: usize) -> Vec<f32> {
    let mut v = prefix.to_vec();
    v.resize(dim, 0.0);
    v
}

/// A search result with the given source, content, and score.
pub fn result(source: &str, content: &str, score: f32) -> SearchResult {
    SearchResult {
        content: content.to_string(),
        metadata: ChunkMetadata { source: source.to_string(), ..ChunkMetadata::default() },
        score,
    }
}
