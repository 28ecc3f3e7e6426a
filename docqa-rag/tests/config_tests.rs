//! Tests for configuration defaults, validation, and environment parsing.

use std::collections::HashMap;
use std::time::Duration;

use docqa_rag::{Distance, RagConfig, RagError, Settings};

fn settings_from(vars: &[(&str, &str)]) -> docqa_rag::Result<Settings> {
    let vars: HashMap<String, String> =
        vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    Settings::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn defaults_match_documented_values() {
    let config = RagConfig::default();
    assert_eq!(config.chunk_size, 500);
    assert_eq!(config.chunk_overlap, 100);
    assert_eq!(config.top_k, 5);
    assert_eq!(config.max_context_length, 3000);
    assert_eq!(config.embedding_batch_size, 100);
    assert!(config.validate().is_ok());
}

#[test]
fn builder_rejects_inconsistent_values() {
    assert!(matches!(
        RagConfig::builder().chunk_size(100).chunk_overlap(100).build(),
        Err(RagError::ConfigError(_))
    ));
    assert!(RagConfig::builder().top_k(0).build().is_err());
    assert!(RagConfig::builder().embedding_batch_size(0).build().is_err());

    let config = RagConfig::builder().chunk_size(256).chunk_overlap(32).top_k(3).build().unwrap();
    assert_eq!((config.chunk_size, config.chunk_overlap, config.top_k), (256, 32, 3));
}

#[test]
fn empty_environment_gives_defaults() {
    let settings = settings_from(&[]).unwrap();
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.services.qdrant_url, "http://localhost:6334");
    assert_eq!(settings.collection.name, "documents");
    assert_eq!(settings.collection.dimensions, 1536);
    assert_eq!(settings.services.request_timeout(), Duration::from_secs(30));
}

#[test]
fn environment_overrides_defaults() {
    let settings = settings_from(&[
        ("DOCQA_COLLECTION", "notes"),
        ("DOCQA_VECTOR_SIZE", "384"),
        ("DOCQA_DISTANCE", "dot"),
        ("DOCQA_CHUNK_SIZE", "200"),
        ("DOCQA_CHUNK_OVERLAP", "50"),
        ("DOCQA_TOP_K", "3"),
        ("DOCQA_MAX_CONTEXT_LENGTH", "1000"),
        ("DOCQA_EMBEDDING_BATCH_SIZE", "16"),
        ("DOCQA_EMBEDDING_MODEL", "text-embedding-3-large"),
        ("DOCQA_CHAT_MODEL", "gpt-4o"),
        ("DOCQA_TEMPERATURE", "0.0"),
        ("DOCQA_REQUEST_TIMEOUT_SECS", "5"),
        ("OPENAI_BASE_URL", "http://localhost:8080/v1"),
    ])
    .unwrap();

    assert_eq!(settings.collection.name, "notes");
    assert_eq!(settings.collection.dimensions, 384);
    assert_eq!(settings.collection.distance, Distance::Dot);
    assert_eq!(settings.rag.chunk_size, 200);
    assert_eq!(settings.rag.chunk_overlap, 50);
    assert_eq!(settings.rag.top_k, 3);
    assert_eq!(settings.rag.max_context_length, 1000);
    assert_eq!(settings.rag.embedding_batch_size, 16);
    assert_eq!(settings.services.embedding_model, "text-embedding-3-large");
    assert_eq!(settings.services.chat_model, "gpt-4o");
    assert_eq!(settings.services.temperature, 0.0);
    assert_eq!(settings.services.request_timeout(), Duration::from_secs(5));
    assert_eq!(settings.services.openai_base_url, "http://localhost:8080/v1");
}

#[test]
fn qdrant_url_takes_precedence_over_host_and_port() {
    let settings = settings_from(&[("QDRANT_HOST", "qdrant"), ("QDRANT_PORT", "7000")]).unwrap();
    assert_eq!(settings.services.qdrant_url, "http://qdrant:7000");

    let settings = settings_from(&[
        ("QDRANT_URL", "https://cloud.example:6334"),
        ("QDRANT_HOST", "ignored"),
    ])
    .unwrap();
    assert_eq!(settings.services.qdrant_url, "https://cloud.example:6334");
}

#[test]
fn blank_values_count_as_unset() {
    let settings = settings_from(&[("DOCQA_TOP_K", "  "), ("DOCQA_COLLECTION", "")]).unwrap();
    assert_eq!(settings.rag.top_k, 5);
    assert_eq!(settings.collection.name, "documents");
}

#[test]
fn unparsable_values_name_the_variable() {
    let err = settings_from(&[("DOCQA_CHUNK_SIZE", "large")]).unwrap_err();
    assert!(matches!(err, RagError::ConfigError(ref msg) if msg.contains("DOCQA_CHUNK_SIZE")));

    let err = settings_from(&[("QDRANT_PORT", "99999")]).unwrap_err();
    assert!(matches!(err, RagError::ConfigError(ref msg) if msg.contains("QDRANT_PORT")));

    let err = settings_from(&[("DOCQA_DISTANCE", "manhattan")]).unwrap_err();
    assert!(matches!(err, RagError::ConfigError(ref msg) if msg.contains("DOCQA_DISTANCE")));
}

#[test]
fn inconsistent_environment_is_rejected() {
    let err = settings_from(&[("DOCQA_CHUNK_SIZE", "100"), ("DOCQA_CHUNK_OVERLAP", "100")])
        .unwrap_err();
    assert!(matches!(err, RagError::ConfigError(_)));

    assert!(settings_from(&[("DOCQA_VECTOR_SIZE", "0")]).is_err());
    assert!(settings_from(&[("DOCQA_TOP_K", "0")]).is_err());
}
