//! Tests for storing embedded chunks and searching them through a [`Retriever`].

mod common;

use std::sync::Arc;

use common::{CountingStore, HashEmbedder, embedded, padded};
use docqa_rag::{
    CollectionConfig, EmbeddingProvider, InMemoryVectorStore, RagError, Retriever, VectorStore,
};

const DIM: usize = 16;

fn retriever_with(store: Arc<CountingStore>) -> Retriever {
    Retriever::new(Arc::new(HashEmbedder::new(DIM)), store, CollectionConfig::new("test", DIM))
}

fn in_memory_retriever() -> Retriever {
    Retriever::new(
        Arc::new(HashEmbedder::new(DIM)),
        Arc::new(InMemoryVectorStore::new()),
        CollectionConfig::new("test", DIM),
    )
}

#[tokio::test]
async fn storing_nothing_touches_nothing() {
    let store = Arc::new(CountingStore::default());
    let retriever = retriever_with(store.clone());

    assert_eq!(retriever.store(&[]).await.unwrap(), 0);
    assert_eq!(store.upsert_calls(), 0);
    assert_eq!(store.create_calls(), 0);
}

#[tokio::test]
async fn stored_chunks_are_counted_and_retrievable() {
    let store = Arc::new(CountingStore::default());
    let retriever = retriever_with(store.clone());
    let embedder = HashEmbedder::new(DIM);

    let mut chunks = Vec::new();
    for (i, text) in ["alpha", "beta", "gamma", "delta"].iter().enumerate() {
        chunks.push(embedded("greek.txt", i, text, embedder.embed(text).await.unwrap()));
    }

    assert_eq!(retriever.store(&chunks).await.unwrap(), 4);
    assert_eq!(store.upsert_calls(), 1);
    assert_eq!(retriever.count().await.unwrap(), 4);

    for chunk in &chunks {
        let results = retriever.search(&chunk.embedding, 1).await.unwrap();
        assert_eq!(results[0].content, chunk.chunk.content);
        assert_eq!(results[0].metadata, chunk.chunk.metadata);
        assert!((results[0].score - 1.0).abs() < 1e-4);
    }
}

#[tokio::test]
async fn dimension_mismatch_names_the_chunk_and_writes_nothing() {
    let store = Arc::new(CountingStore::default());
    let retriever = retriever_with(store.clone());

    let chunks = vec![
        embedded("a.txt", 0, "fine", padded(&[1.0], DIM)),
        embedded("a.txt", 1, "also fine", padded(&[0.0, 1.0], DIM)),
        embedded("a.txt", 2, "too short", vec![1.0; DIM - 1]),
    ];
    let err = retriever.store(&chunks).await.unwrap_err();

    assert!(matches!(
        err,
        RagError::DimensionMismatch { index: 2, expected: DIM, actual } if actual == DIM - 1
    ));
    assert_eq!(store.upsert_calls(), 0);
    assert!(!store.collection_exists("test").await.unwrap());
}

#[tokio::test]
async fn search_returns_exactly_top_k_or_everything() {
    let retriever = in_memory_retriever();
    let embedder = HashEmbedder::new(DIM);

    let mut chunks = Vec::new();
    for i in 0..6 {
        let text = format!("chunk number {i}");
        chunks.push(embedded("n.txt", i, &text, embedder.embed(&text).await.unwrap()));
    }
    retriever.store(&chunks).await.unwrap();

    let query = embedder.embed("query").await.unwrap();
    assert_eq!(retriever.search(&query, 3).await.unwrap().len(), 3);
    assert_eq!(retriever.search(&query, 6).await.unwrap().len(), 6);
    assert_eq!(retriever.search(&query, 10).await.unwrap().len(), 6);

    let results = retriever.search(&query, 6).await.unwrap();
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn empty_collection_yields_no_results() {
    let retriever = in_memory_retriever();
    retriever.initialize_collection(false).await.unwrap();
    assert!(retriever.search(&padded(&[1.0], DIM), 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn similar_vectors_rank_above_orthogonal_ones() {
    let retriever = in_memory_retriever();
    let chunks = vec![
        embedded("ml.txt", 0, "machine learning basics", padded(&[0.9, 0.1, 0.0], DIM)),
        embedded("ml.txt", 1, "more machine learning", padded(&[0.8, 0.2, 0.0], DIM)),
        embedded("cooking.txt", 0, "how to boil pasta", padded(&[0.0, 0.0, 0.9], DIM)),
    ];
    retriever.store(&chunks).await.unwrap();

    let results = retriever.search(&padded(&[0.85, 0.15, 0.0], DIM), 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.metadata.source == "ml.txt"));
    assert!(results.iter().all(|r| r.score > 0.9));

    let all = retriever.search(&padded(&[0.85, 0.15, 0.0], DIM), 3).await.unwrap();
    assert_eq!(all[2].metadata.source, "cooking.txt");
    assert!(all[2].score.abs() < 1e-6);
}

#[tokio::test]
async fn storing_the_same_chunks_twice_does_not_duplicate() {
    let retriever = in_memory_retriever();
    let chunks = vec![
        embedded("a.txt", 0, "first", padded(&[1.0], DIM)),
        embedded("a.txt", 1, "second", padded(&[0.0, 1.0], DIM)),
    ];

    retriever.store(&chunks).await.unwrap();
    retriever.store(&chunks).await.unwrap();
    assert_eq!(retriever.count().await.unwrap(), 2);
}

#[tokio::test]
async fn identical_content_from_different_positions_is_kept_apart() {
    let retriever = in_memory_retriever();
    let chunks = vec![
        embedded("a.txt", 0, "same words", padded(&[1.0], DIM)),
        embedded("a.txt", 1, "same words", padded(&[1.0], DIM)),
        embedded("b.txt", 0, "same words", padded(&[1.0], DIM)),
    ];
    retriever.store(&chunks).await.unwrap();
    assert_eq!(retriever.count().await.unwrap(), 3);
}

#[tokio::test]
async fn zero_top_k_is_rejected() {
    let retriever = in_memory_retriever();
    assert!(matches!(
        retriever.search(&padded(&[1.0], DIM), 0).await,
        Err(RagError::Validation(_))
    ));
    assert!(matches!(retriever.search_by_text("anything", 0).await, Err(RagError::Validation(_))));
}

#[tokio::test]
async fn wrong_query_dimension_is_rejected() {
    let retriever = in_memory_retriever();
    retriever.initialize_collection(false).await.unwrap();
    let err = retriever.search(&[1.0, 0.0], 1).await.unwrap_err();
    assert!(matches!(err, RagError::QueryDimensionMismatch { expected: DIM, actual: 2 }));
}

#[tokio::test]
async fn searching_a_missing_collection_fails() {
    let retriever = in_memory_retriever();
    let err = retriever.search(&padded(&[1.0], DIM), 3).await.unwrap_err();
    assert!(matches!(err, RagError::CollectionNotFound(ref name) if name == "test"));
}

#[tokio::test]
async fn text_search_embeds_the_query() {
    let retriever = in_memory_retriever();
    let embedder = HashEmbedder::new(DIM);
    let texts = ["rust ownership", "tokio runtime", "serde derive"];

    let mut chunks = Vec::new();
    for (i, text) in texts.iter().enumerate() {
        chunks.push(embedded("notes.txt", i, text, embedder.embed(text).await.unwrap()));
    }
    retriever.store(&chunks).await.unwrap();

    let results = retriever.search_by_text("tokio runtime", 1).await.unwrap();
    assert_eq!(results[0].content, "tokio runtime");
}

#[tokio::test]
async fn recreating_the_collection_clears_it() {
    let retriever = in_memory_retriever();
    retriever.store(&[embedded("a.txt", 0, "x", padded(&[1.0], DIM))]).await.unwrap();
    assert_eq!(retriever.count().await.unwrap(), 1);

    retriever.initialize_collection(true).await.unwrap();
    assert_eq!(retriever.count().await.unwrap(), 0);

    retriever.initialize_collection(false).await.unwrap();
    assert_eq!(retriever.count().await.unwrap(), 0);
}

#[tokio::test]
async fn chunks_are_embedded_in_bounded_batches() {
    let embedder = Arc::new(HashEmbedder::new(DIM));
    let retriever = Retriever::new(
        embedder.clone(),
        Arc::new(InMemoryVectorStore::new()),
        CollectionConfig::new("test", DIM),
    )
    .with_embedding_batch_size(4);

    let chunks: Vec<_> =
        (0..10).map(|i| embedded("a.txt", i, &format!("text {i}"), Vec::new()).chunk).collect();
    let out = retriever.embed_chunks(chunks).await.unwrap();

    assert_eq!(out.len(), 10);
    assert_eq!(embedder.batch_calls.load(std::sync::atomic::Ordering::SeqCst), 3);
    assert!(out.iter().all(|c| c.embedding.len() == DIM));
    assert_eq!(out[7].chunk.content, "text 7");
    assert_eq!(out[7].embedding, embedder.embed("text 7").await.unwrap());
}
