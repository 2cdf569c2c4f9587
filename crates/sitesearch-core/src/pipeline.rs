//! Parse → rank → index driver.
//!
//! The `Pipeline` runs the offline half of the engine: extraction of the
//! mirrored pages, link graph construction, PageRank and the index build.
//! Each stage is timed into the pipeline's [`StageMetrics`].

use crate::cache::DocumentCache;
use crate::config::EngineConfig;
use crate::document::{Corpus, Document};
use crate::error::PipelineError;
use crate::graph::{GraphBuilder, PageRank, PageRankReport};
use crate::index::IndexWriter;
use crate::metrics::{StageMetrics, StageTiming};
use crate::progress::{NoopProgress, ProgressCounter, ProgressSink};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub const STAGE_PARSE: &str = "parse";
pub const STAGE_GRAPH: &str = "graph";
pub const STAGE_PAGERANK: &str = "pagerank";
pub const STAGE_INDEX: &str = "index";

/// Outcome of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Documents handed to the graph builder
    pub parsed_documents: usize,
    /// Documents left after duplicate URLs collapsed
    pub unique_documents: usize,
    pub edges: usize,
    pub pagerank: PageRankReport,
    pub index_path: PathBuf,
    /// Stage timings, longest first
    pub stages: Vec<StageTiming>,
}

/// Offline indexing pipeline.
///
/// # Example
///
/// ```
/// use sitesearch_core::{Document, EngineConfig};
/// use sitesearch_core::pipeline::Pipeline;
///
/// let dir = tempfile::tempdir()?;
/// let docs = vec![
///     Document::new("a.html", "example.org/a").with_title("Alpha").link_to("example.org/b", "B"),
///     Document::new("b.html", "example.org/b").with_title("Beta").link_to("example.org/a", "A"),
/// ];
/// let report = Pipeline::new(EngineConfig::default()).rank_and_index(docs, dir.path())?;
/// assert_eq!(report.unique_documents, 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Pipeline {
    config: EngineConfig,
    progress: Arc<dyn ProgressSink>,
    metrics: Arc<StageMetrics>,
    cache: Option<Arc<DocumentCache>>,
}

impl Pipeline {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            progress: Arc::new(NoopProgress),
            metrics: Arc::new(StageMetrics::new()),
            cache: None,
        }
    }

    /// Reports parse, PageRank and indexing progress to `sink`.
    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = sink;
        self
    }

    /// Records stage timings into a caller-owned collector.
    pub fn with_metrics(mut self, metrics: Arc<StageMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Reuses documents parsed by an earlier run over the same website
    /// directory, and caches fresh parses for the next one.
    pub fn with_cache(mut self, cache: Arc<DocumentCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &StageMetrics {
        &self.metrics
    }

    /// Extracts the mirror in `website_dir`, ranks it and indexes it into `index_dir`.
    #[cfg(feature = "html")]
    pub fn run(
        &self,
        website_dir: impl AsRef<Path>,
        index_dir: impl AsRef<Path>,
    ) -> Result<PipelineReport, PipelineError> {
        let website_dir = website_dir.as_ref();
        if !website_dir.is_dir() {
            return Err(PipelineError::WebsiteDir(website_dir.display().to_string()));
        }
        info!("Parsing website from directory {}", website_dir.display());
        let docs = self
            .metrics
            .time(STAGE_PARSE, || self.parse(website_dir))?;
        self.rank_and_index(docs, index_dir)
    }

    /// Cached documents when available, otherwise a fresh parse.
    ///
    /// Cache failures only cost the parse they would have saved.
    #[cfg(feature = "html")]
    fn parse(&self, website_dir: &Path) -> Result<Vec<Document>, crate::extract::ExtractError> {
        if let Some(cache) = &self.cache {
            match cache.load(website_dir) {
                Ok(Some(docs)) => return Ok(docs),
                Ok(None) => {}
                Err(e) => tracing::warn!("Failed to load cached documents: {}", e),
            }
        }
        let docs = crate::extract::parse_website(website_dir, self.progress.as_ref())?;
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(website_dir, &docs) {
                tracing::warn!("Failed to cache documents: {}", e);
            }
        }
        Ok(docs)
    }

    /// Ranks already extracted documents and indexes them into `index_dir`.
    pub fn rank_and_index(
        &self,
        docs: Vec<Document>,
        index_dir: impl AsRef<Path>,
    ) -> Result<PipelineReport, PipelineError> {
        let parsed_documents = docs.len();
        let mut corpus = Corpus::new(docs);

        let graph = self.metrics.time(STAGE_GRAPH, || {
            GraphBuilder::new(self.config.graph.dangling).build(&mut corpus)
        })?;

        let pagerank = self.metrics.time(STAGE_PAGERANK, || {
            PageRank::new(self.config.pagerank.clone()).compute(
                &mut corpus,
                &graph,
                self.progress.as_ref(),
            )
        })?;

        let summary = self.metrics.time(STAGE_INDEX, || {
            let mut writer = IndexWriter::create(index_dir.as_ref())?;
            let counter = ProgressCounter::new(
                corpus.len(),
                "Indexed documents",
                self.progress.as_ref(),
            );
            for doc in corpus.iter() {
                writer.add(doc)?;
                counter.tick();
            }
            writer.commit()
        })?;

        self.metrics.log_summary();
        let report = PipelineReport {
            parsed_documents,
            unique_documents: corpus.len(),
            edges: graph.edge_count(),
            pagerank,
            index_path: summary.path,
            stages: self.metrics.snapshot(),
        };
        info!(
            "Indexed {} unique documents ({} parsed, {} links)",
            report.unique_documents, report.parsed_documents, report.edges
        );
        Ok(report)
    }
}
