//! Index command implementation.

use anyhow::{anyhow, Context, Result};
use sitesearch_core::cache::{DocumentCache, CACHE_FILE};
use sitesearch_core::pipeline::{Pipeline, PipelineReport};
use sitesearch_core::progress::LogProgress;
use sitesearch_core::EngineConfig;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Extracts, ranks and indexes the mirror in `website_dir`.
///
/// With `use_cache` the parsed documents are kept in `documents.redb` in
/// the index directory and reused by the next cached run.
pub fn execute_index(
    website_dir: &Path,
    index_dir: &Path,
    config: EngineConfig,
    use_cache: bool,
) -> Result<PipelineReport> {
    if !website_dir.is_dir() {
        return Err(anyhow!(
            "The directory {} does not exist!",
            website_dir.display()
        ));
    }

    info!(
        "Indexing {} into {}",
        website_dir.display(),
        index_dir.display()
    );
    let mut pipeline = Pipeline::new(config).with_progress(Arc::new(LogProgress));
    if use_cache {
        let cache_path = index_dir.join(CACHE_FILE);
        let cache = DocumentCache::open(&cache_path)
            .with_context(|| format!("Failed to open document cache {}", cache_path.display()))?;
        pipeline = pipeline.with_cache(Arc::new(cache));
    }
    pipeline
        .run(website_dir, index_dir)
        .with_context(|| format!("Failed to index {}", website_dir.display()))
}
