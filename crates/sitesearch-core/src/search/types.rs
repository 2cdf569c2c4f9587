//! Request, result and error types of the query engine.

use super::RankingAlgorithm;
use crate::document::Document;
use crate::error::IndexError;
use serde::Serialize;
use std::time::{Duration, Instant};
use tantivy::query::QueryParserError;
use thiserror::Error;

/// Errors returned by query operations.
///
/// A query that matches nothing is not an error; it yields an empty list.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The ranking algorithm name is not one of the supported keys
    #[error("Invalid ranking algorithm: {given}. Available ranking algorithms: {}", .valid.join(", "))]
    InvalidAlgorithm { given: String, valid: Vec<String> },
    /// The query text could not be parsed
    #[error("Malformed query: {0}")]
    MalformedQuery(String),
    /// Nothing has been indexed in the index directory yet
    #[error("No index found at {0}. Indexing must run before searching.")]
    IndexMissing(String),
    /// The request deadline passed before results were ready
    #[error("Search deadline exceeded")]
    DeadlineExceeded,
    #[error(transparent)]
    Index(IndexError),
}

impl From<IndexError> for SearchError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::Missing(dir) => SearchError::IndexMissing(dir),
            other => SearchError::Index(other),
        }
    }
}

impl From<tantivy::TantivyError> for SearchError {
    fn from(err: tantivy::TantivyError) -> Self {
        SearchError::Index(IndexError::Engine(err))
    }
}

impl From<std::io::Error> for SearchError {
    fn from(err: std::io::Error) -> Self {
        SearchError::Index(IndexError::Io(err))
    }
}

impl From<QueryParserError> for SearchError {
    fn from(err: QueryParserError) -> Self {
        SearchError::MalformedQuery(err.to_string())
    }
}

/// A ranked result: the stored document and the score it was ordered by.
///
/// For `pagerank` the score is the lexical score that admitted the
/// document; for `custom` it is the blended score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub document: Document,
    pub score: f64,
}

/// A full query request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub limit: usize,
    pub algorithm: RankingAlgorithm,
    /// Abort with [`SearchError::DeadlineExceeded`] once this instant passes
    pub deadline: Option<Instant>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, limit: usize, algorithm: RankingAlgorithm) -> Self {
        Self {
            query: query.into(),
            limit,
            algorithm,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }
}

pub(crate) fn check_deadline(deadline: Option<Instant>) -> Result<(), SearchError> {
    match deadline {
        Some(deadline) if Instant::now() >= deadline => Err(SearchError::DeadlineExceeded),
        _ => Ok(()),
    }
}
