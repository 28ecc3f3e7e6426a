//! Error types for the `docqa-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in chunking, retrieval, and answering.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid arguments supplied by the caller.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An embedding attached to a chunk does not match the collection dimension.
    #[error("Dimension mismatch for chunk {index}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Position of the offending chunk in the input sequence.
        index: usize,
        /// The collection's configured dimension.
        expected: usize,
        /// The length of the supplied vector.
        actual: usize,
    },

    /// A query vector does not match the collection dimension.
    #[error("Query dimension mismatch: expected {expected}, got {actual}")]
    QueryDimensionMismatch {
        /// The collection's configured dimension.
        expected: usize,
        /// The length of the supplied vector.
        actual: usize,
    },

    /// The requested collection does not exist in the vector store.
    #[error("Collection '{0}' not found")]
    CollectionNotFound(String),

    /// No credential is configured for an external service.
    #[error("Authentication error ({provider}): {message}")]
    Authentication {
        /// The service that rejected or lacked the credential.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The upstream service rejected the call due to rate limiting.
    #[error("Rate limited ({provider}): {message}")]
    RateLimited {
        /// The service that applied the limit.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The upstream service could not be reached or failed transiently.
    #[error("Service unavailable ({provider}): {message}")]
    ServiceUnavailable {
        /// The unreachable service.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A non-retryable error during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector store could not be reached at its configured address.
    #[error("Vector store unreachable ({backend}): {message}")]
    StoreUnreachable {
        /// The vector store backend that could not be reached.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector store backend failed a request or returned unreadable data.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A non-retryable error while generating an answer.
    #[error("Answer error ({provider}): {message}")]
    AnswerError {
        /// The answering backend that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A document could not be read.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// The file or directory being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification of a [`RagError`], used by callers to decide
/// whether to retry, report, or abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad arguments. Never retried.
    Validation,
    /// Network, rate-limit, or unavailable upstream. Safe to retry with backoff.
    Transient,
    /// Missing credential, unreachable store, or invalid setting. Fatal.
    Configuration,
    /// The target collection does not exist.
    NotFound,
    /// The upstream service returned a non-retryable failure.
    Service,
    /// Local file access failed.
    Io,
}

impl RagError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_)
            | Self::DimensionMismatch { .. }
            | Self::QueryDimensionMismatch { .. } => ErrorKind::Validation,
            Self::RateLimited { .. } | Self::ServiceUnavailable { .. } => ErrorKind::Transient,
            Self::Authentication { .. } | Self::StoreUnreachable { .. } | Self::ConfigError(_) => {
                ErrorKind::Configuration
            }
            Self::CollectionNotFound(_) => ErrorKind::NotFound,
            Self::EmbeddingError { .. }
            | Self::VectorStoreError { .. }
            | Self::AnswerError { .. } => ErrorKind::Service,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Whether an orchestration layer may retry the failed call.
    ///
    /// Store writes are upserts keyed by deterministic ids, so retrying a
    /// failed `store` never duplicates points.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
