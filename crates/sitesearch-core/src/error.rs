//! Error types for sitesearch-core.
//!
//! This module defines the errors shared across the library: link graph
//! invariant failures, lexical index failures, document cache failures and
//! the umbrella error of a full pipeline run. Query-time errors live in
//! [`search::SearchError`](crate::search::SearchError), per-page extraction
//! errors in `extract::ExtractError`.

use thiserror::Error;

/// Invariant failures of the link graph and the PageRank engine.
///
/// These indicate a broken validation step, never bad input data, and abort
/// the run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphError {
    /// A validated out-link points at a URL missing from the corpus
    #[error("Link graph inconsistency: {source_url} links to unknown document {target_url}")]
    UnknownTarget {
        source_url: String,
        target_url: String,
    },
    /// An inbound source has no out-links, so its rank cannot be divided
    #[error("Document {url} contributes rank but has zero out-links")]
    ZeroOutDegree { url: String },
    /// The link graph was built for a different corpus
    #[error("Link graph covers {graph} documents but the corpus has {corpus}")]
    SizeMismatch { graph: usize, corpus: usize },
    /// Invalid PageRank configuration
    #[error("Invalid PageRank configuration: {0}")]
    InvalidConfig(String),
}

/// Errors raised while building, opening or reading the lexical index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// No committed index exists in the directory
    #[error("No index found at {0}. Indexing must run before searching.")]
    Missing(String),
    /// Filesystem failure around the index directory
    #[error("Index I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Index storage failure outside tantivy, such as a held build lock
    #[error("Index storage error: {0}")]
    Storage(String),
    /// tantivy failure while building or reading
    #[error("Index engine error: {0}")]
    Engine(#[from] tantivy::TantivyError),
    /// Stored bytes could not be (de)serialized
    #[error("Index serialization error: {0}")]
    Serialization(String),
    /// The index was built with a different analyzer or schema
    #[error("Index was built with analyzer '{found}', expected '{expected}'")]
    AnalyzerMismatch { expected: String, found: String },
    /// Two documents with the same unique key were written
    #[error("Duplicate {field} in index: {value}")]
    DuplicateKey { field: &'static str, value: String },
}

impl From<serde_json::Error> for IndexError {
    fn from(err: serde_json::Error) -> Self {
        IndexError::Serialization(err.to_string())
    }
}

/// Errors of the parsed document cache.
///
/// A run treats them as a cache miss and parses the website instead.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache database error: {0}")]
    Database(String),
    #[error("Cache serialization error: {0}")]
    Serialization(String),
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

/// Errors that abort a parse → rank → index run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[cfg(feature = "html")]
    #[error(transparent)]
    Extract(#[from] crate::extract::ExtractError),
    /// The website directory does not exist or is not a directory
    #[error("Website directory not found: {0}")]
    WebsiteDir(String),
}
