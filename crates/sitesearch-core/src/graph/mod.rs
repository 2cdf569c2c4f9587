//! Link graph construction and PageRank.
//!
//! The [`GraphBuilder`] closes the raw extracted links of a [`Corpus`] into a
//! validated graph: unknown and self links are dropped, duplicate URLs are
//! collapsed, inbound links are derived and dangling documents are handled
//! per the configured [`DanglingPolicy`]. The result is a [`LinkGraph`], an
//! index-addressed adjacency the [`PageRank`] engine iterates over.
//!
//! # Example
//!
//! ```
//! use sitesearch_core::{Corpus, Document, GraphBuilder, PageRank, PageRankConfig};
//! use sitesearch_core::progress::NoopProgress;
//!
//! let mut corpus = Corpus::new(vec![
//!     Document::new("a.html", "example.org/a").link_to("example.org/b", "B"),
//!     Document::new("b.html", "example.org/b").link_to("example.org/a", "A"),
//! ]);
//! let graph = GraphBuilder::default().build(&mut corpus)?;
//! let report = PageRank::new(PageRankConfig::default()).compute(&mut corpus, &graph, &NoopProgress)?;
//! assert!((report.rank_sum - 2.0).abs() < 1e-6);
//! # Ok::<(), sitesearch_core::error::GraphError>(())
//! ```

mod builder;
mod pagerank;


pub use builder::{DanglingPolicy, GraphBuilder};
pub use pagerank::{PageRank, PageRankReport};

use crate::document::Corpus;
use crate::error::GraphError;

/// Index-addressed link graph over a corpus.
///
/// Node `i` is the corpus document at position `i`. Edges keep multigraph
/// semantics: two links from `a` to `b` count twice in `a`'s out-degree and
/// appear twice in `b`'s inbound list. The graph carries the
/// [`DanglingPolicy`] it was built with; PageRank applies the same one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkGraph {
    policy: DanglingPolicy,
    out_degree: Vec<usize>,
    inbound: Vec<Vec<usize>>,
}

impl LinkGraph {
    /// Derives the adjacency from the corpus' validated `links_out`.
    ///
    /// Fails with [`GraphError::UnknownTarget`] if any out-link points at a
    /// URL that is not in the corpus.
    pub fn from_corpus(corpus: &Corpus, policy: DanglingPolicy) -> Result<Self, GraphError> {
        let n = corpus.len();
        let mut out_degree = Vec::with_capacity(n);
        let mut inbound = vec![Vec::new(); n];

        for (source, doc) in corpus.iter().enumerate() {
            out_degree.push(doc.links_out.len());
            for link in &doc.links_out {
                let target =
                    corpus
                        .index_of(&link.url)
                        .ok_or_else(|| GraphError::UnknownTarget {
                            source_url: doc.url.clone(),
                            target_url: link.url.clone(),
                        })?;
                inbound[target].push(source);
            }
        }

        Ok(Self {
            policy,
            out_degree,
            inbound,
        })
    }

    #[cfg(test)]
    pub(crate) fn from_parts(out_degree: Vec<usize>, inbound: Vec<Vec<usize>>) -> Self {
        Self {
            policy: DanglingPolicy::default(),
            out_degree,
            inbound,
        }
    }

    /// Dangling treatment applied while building this graph.
    pub fn policy(&self) -> DanglingPolicy {
        self.policy
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.out_degree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out_degree.is_empty()
    }

    pub fn out_degree(&self, node: usize) -> usize {
        self.out_degree[node]
    }

    /// Sources of every edge pointing at `node`, one entry per edge.
    pub fn inbound(&self, node: usize) -> &[usize] {
        &self.inbound[node]
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.out_degree.iter().sum()
    }

    /// Nodes without out-links.
    pub fn dangling(&self) -> Vec<usize> {
        (0..self.len())
            .filter(|&node| self.out_degree[node] == 0)
            .collect()
    }
}
