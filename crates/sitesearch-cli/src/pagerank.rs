//! Pagerank listing command.

use crate::search::open_engine;
use anyhow::{Context, Result};
use sitesearch_core::{SearchConfig, SearchHit};
use std::path::Path;

/// The `limit` indexed documents with the highest stored pagerank.
pub fn execute_pagerank(index_dir: &Path, limit: usize) -> Result<Vec<SearchHit>> {
    let engine = open_engine(index_dir, SearchConfig::default())?;
    engine
        .top_pagerank(limit)
        .context("Failed to list documents by pagerank")
}
