//! # sitesearch core
//!
//! Library for ranked full-text search over a locally mirrored website.
//!
//! Parsed pages become [`Document`]s, their links are closed into a link
//! graph, an iterative PageRank assigns every page an authority score, and
//! the ranked documents are bulk-loaded into a persistent multi-field
//! inverted index that serves queries under several ranking algorithms.
//!
//! ## Modules
//!
//! - [`document`] - Document record, links and the URL-keyed corpus arena
//! - [`graph`] - Link graph construction and the PageRank engine
//! - [`index`] - Persistent multi-field lexical index (tantivy-backed)
//! - [`search`] - Query parsing, weighting models and ranked retrieval
//! - [`extract`] - HTML extraction from HTTrack mirrors (feature `html`)
//! - [`cache`] - Redb-backed cache of parsed websites
//! - [`pipeline`] - Parse → rank → index driver with stage timings
//! - [`progress`] - Progress sinks for long-running loops
//! - [`metrics`] - Per-stage timing collector
//! - [`config`] - Production defaults and runtime configuration
//! - [`error`] - Error types for graph, index and pipeline operations

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
#[cfg(feature = "html")]
pub mod extract;
pub mod graph;
pub mod index;
pub mod metrics;
pub mod pipeline;
pub mod progress;
pub mod search;

pub use cache::DocumentCache;
pub use config::{EngineConfig, GraphConfig, PageRankConfig, SearchConfig};
pub use document::{canonicalize_url, Corpus, Document, Link};
pub use graph::{DanglingPolicy, GraphBuilder, LinkGraph, PageRank, PageRankReport};
pub use search::{RankingAlgorithm, SearchEngine, SearchError, SearchHit};
