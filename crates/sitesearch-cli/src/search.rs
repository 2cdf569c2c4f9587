//! Search command implementation.

use anyhow::{Context, Result};
use sitesearch_core::{RankingAlgorithm, SearchConfig, SearchEngine, SearchError, SearchHit};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;

/// Hits of one query and how long the query took.
#[derive(Debug)]
pub struct SearchOutcome {
    pub hits: Vec<SearchHit>,
    pub elapsed: Duration,
}

/// Opens the index in `index_dir` and runs one query against it.
pub fn execute_search(
    query: &str,
    limit: usize,
    algorithm: RankingAlgorithm,
    index_dir: &Path,
    config: SearchConfig,
) -> Result<SearchOutcome> {
    let engine = open_engine(index_dir, config)?;
    run_query(&engine, query, limit, algorithm)
}

/// Opens the index, pointing at `sitesearch index` when there is none.
pub fn open_engine(index_dir: &Path, config: SearchConfig) -> Result<SearchEngine> {
    info!("Opening index: {}", index_dir.display());
    let engine = SearchEngine::open(index_dir, config).map_err(|e| match e {
        SearchError::IndexMissing(_) => anyhow::Error::new(e).context(format!(
            "No index found in {}. Run `sitesearch index <WEBSITE_DIR>` first.",
            index_dir.display()
        )),
        other => anyhow::Error::new(other)
            .context(format!("Failed to open index: {}", index_dir.display())),
    })?;
    info!(
        "Loaded index with {} documents",
        engine.index().document_count()
    );
    Ok(engine)
}

/// Runs one timed query on an opened engine.
pub fn run_query(
    engine: &SearchEngine,
    query: &str,
    limit: usize,
    algorithm: RankingAlgorithm,
) -> Result<SearchOutcome> {
    let start = Instant::now();
    let hits = engine
        .search_hits(query, limit, algorithm)
        .with_context(|| format!("Search failed for \"{}\"", query))?;
    let elapsed = start.elapsed();

    info!("Found {} results in {:?}", hits.len(), elapsed);
    Ok(SearchOutcome { hits, elapsed })
}
