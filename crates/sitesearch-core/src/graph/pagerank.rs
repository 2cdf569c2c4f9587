//! Iterative PageRank over the link graph.
//!
//! Every epoch computes, for each document `d`:
//!
//! ```text
//! rank'(d) = (1 - damping) + damping * Σ rank(s) / outdeg(s)   for s in inbound(d)
//! ```
//!
//! Updates are synchronous: the whole epoch reads the previous epoch's
//! ranks, so results do not depend on iteration order or thread count.
//! Within an epoch documents are updated in parallel; the epoch boundary is
//! the barrier.
//!
//! Dangling documents are handled by the policy the [`LinkGraph`] was built
//! with. Under [`DanglingPolicy::Redistribute`] their rank is spread evenly
//! over every document each epoch.

use super::{DanglingPolicy, LinkGraph};
use crate::config::PageRankConfig;
use crate::document::Corpus;
use crate::error::GraphError;
use crate::progress::ProgressSink;
use rayon::prelude::*;
use tracing::{info, instrument};

const PROGRESS_LABEL: &str = "PageRank epoch";

/// Outcome of a PageRank run.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRankReport {
    /// Epochs actually run (fewer than configured when a tolerance stopped early)
    pub epochs_run: usize,
    pub document_count: usize,
    /// Sum of all ranks; close to `document_count` for a well-formed graph
    pub rank_sum: f64,
    /// Largest per-document change in the final epoch
    pub last_delta: f64,
    /// `true` if the configured tolerance was reached
    pub converged: bool,
}

impl PageRankReport {
    /// Absolute deviation of the rank sum from the document count.
    pub fn conservation_error(&self) -> f64 {
        (self.rank_sum - self.document_count as f64).abs()
    }
}

/// Fixed-point PageRank solver.
#[derive(Debug, Clone, Default)]
pub struct PageRank {
    config: PageRankConfig,
}

impl PageRank {
    pub fn new(config: PageRankConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PageRankConfig {
        &self.config
    }

    /// Seeds every document with rank 1.0 and runs the configured epochs.
    pub fn compute(
        &self,
        corpus: &mut Corpus,
        graph: &LinkGraph,
        progress: &dyn ProgressSink,
    ) -> Result<PageRankReport, GraphError> {
        corpus.reset_pageranks();
        self.compute_seeded(corpus, graph, progress)
    }

    /// Runs the configured epochs starting from the documents' current ranks.
    #[instrument(skip_all, fields(documents = corpus.len(), epochs = self.config.epochs))]
    pub fn compute_seeded(
        &self,
        corpus: &mut Corpus,
        graph: &LinkGraph,
        progress: &dyn ProgressSink,
    ) -> Result<PageRankReport, GraphError> {
        self.validate_config()?;
        if graph.len() != corpus.len() {
            return Err(GraphError::SizeMismatch {
                graph: graph.len(),
                corpus: corpus.len(),
            });
        }
        check_out_degrees(corpus, graph)?;

        let damping = self.config.damping;
        let n = graph.len();
        let dangling = match graph.policy() {
            DanglingPolicy::Redistribute => graph.dangling(),
            DanglingPolicy::MirrorInbound | DanglingPolicy::Sink => Vec::new(),
        };

        let mut ranks: Vec<f64> = corpus.iter().map(|doc| doc.pagerank).collect();
        let mut epochs_run = 0;
        let mut last_delta = 0.0;
        let mut converged = false;

        for epoch in 0..self.config.epochs {
            let dangling_share = if dangling.is_empty() {
                0.0
            } else {
                damping * dangling.iter().map(|&node| ranks[node]).sum::<f64>() / n as f64
            };

            let next: Vec<f64> = (0..n)
                .into_par_iter()
                .map(|node| {
                    let inflow: f64 = graph
                        .inbound(node)
                        .iter()
                        .map(|&source| ranks[source] / graph.out_degree(source) as f64)
                        .sum();
                    (1.0 - damping) + damping * inflow + dangling_share
                })
                .collect();

            last_delta = next
                .iter()
                .zip(&ranks)
                .map(|(new, old)| (new - old).abs())
                .fold(0.0, f64::max);
            ranks = next;
            epochs_run = epoch + 1;
            progress.report(epochs_run, self.config.epochs, PROGRESS_LABEL);

            if self
                .config
                .tolerance
                .is_some_and(|tolerance| last_delta < tolerance)
            {
                converged = true;
                break;
            }
        }

        for (doc, rank) in corpus.documents_mut().iter_mut().zip(&ranks) {
            doc.pagerank = *rank;
        }

        let report = PageRankReport {
            epochs_run,
            document_count: n,
            rank_sum: ranks.iter().sum(),
            last_delta,
            converged,
        };
        info!(
            "Total docs: {}, Pagerank sum: {:.3} after {} epochs",
            report.document_count, report.rank_sum, report.epochs_run
        );
        Ok(report)
    }

    fn validate_config(&self) -> Result<(), GraphError> {
        let damping = self.config.damping;
        if !(0.0..=1.0).contains(&damping) {
            return Err(GraphError::InvalidConfig(format!(
                "damping must be within [0, 1], got {}",
                damping
            )));
        }
        if let Some(tolerance) = self.config.tolerance {
            if !(tolerance.is_finite() && tolerance > 0.0) {
                return Err(GraphError::InvalidConfig(format!(
                    "tolerance must be a positive number, got {}",
                    tolerance
                )));
            }
        }
        Ok(())
    }
}

/// Every document that contributes rank must have at least one out-link.
fn check_out_degrees(corpus: &Corpus, graph: &LinkGraph) -> Result<(), GraphError> {
    for node in 0..graph.len() {
        if let Some(&source) = graph
            .inbound(node)
            .iter()
            .find(|&&source| graph.out_degree(source) == 0)
        {
            return Err(GraphError::ZeroOutDegree {
                url: corpus.documents()[source].url.clone(),
            });
        }
    }
    Ok(())
}
