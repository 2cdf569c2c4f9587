//! Link graph construction.
//!
//! Building runs four steps over the corpus, in order:
//!
//! 1. **Validation**: out-links are restricted to known documents and
//!    self-links are removed. External links are dropped silently.
//! 2. **Duplicate removal**: documents mirrored under the same URL collapse
//!    to the one with the most validated out-links.
//! 3. **Inverse edges**: every surviving edge is transposed into the
//!    target's `links_in`, and the distinct anchor texts pointing at a
//!    document become its `links_in_keywords`.
//! 4. **Dangling policy**: documents left without out-links are treated per
//!    [`DanglingPolicy`].

use super::LinkGraph;
use crate::document::{Corpus, Document, Link};
use crate::error::GraphError;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument};

/// Treatment of documents without outbound links.
///
/// The choice measurably changes PageRank convergence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DanglingPolicy {
    /// Mirror the document's inbound links as its outbound links, adding the
    /// matching inbound edges on the sources.
    #[default]
    MirrorInbound,
    /// Keep the graph as is; PageRank spreads dangling rank uniformly over
    /// all documents every epoch.
    Redistribute,
    /// Keep the graph as is; dangling rank leaks out of the graph.
    Sink,
}

/// Builds a validated link graph from raw extracted links.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphBuilder {
    policy: DanglingPolicy,
}

impl GraphBuilder {
    pub fn new(policy: DanglingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DanglingPolicy {
        self.policy
    }

    /// Closes the corpus' links into a graph, mutating every document's
    /// `links_out`, `links_in` and `links_in_keywords` in place.
    #[instrument(skip_all, fields(documents = corpus.len()))]
    pub fn build(&self, corpus: &mut Corpus) -> Result<LinkGraph, GraphError> {
        let dropped = validate_links(corpus);
        debug!("Dropped {} external or self links", dropped);

        let removed = remove_duplicates(corpus);
        info!(
            "Removed {} duplicate document{}. Unique documents left: {}",
            removed,
            if removed == 1 { "" } else { "s" },
            corpus.len()
        );

        add_links_in(corpus)?;

        if self.policy == DanglingPolicy::MirrorInbound {
            let (mirrored, isolated) = mirror_dangling(corpus);
            debug!(
                "Mirrored inbound links of {} dangling documents ({} isolated)",
                mirrored, isolated
            );
        }

        let graph = LinkGraph::from_corpus(corpus, self.policy)?;
        info!(
            "Built link graph: {} documents, {} edges, {} dangling",
            graph.len(),
            graph.edge_count(),
            graph.dangling().len()
        );
        Ok(graph)
    }
}

/// Keeps only out-links to known documents other than the source itself.
///
/// Returns the number of links dropped.
fn validate_links(corpus: &mut Corpus) -> usize {
    let known: HashSet<String> = corpus.iter().map(|doc| doc.url.clone()).collect();

    corpus
        .documents_mut()
        .par_iter_mut()
        .map(|doc| {
            let before = doc.links_out.len();
            let own_url = doc.url.as_str();
            doc.links_out
                .retain(|link| link.url != own_url && known.contains(&link.url));
            before - doc.links_out.len()
        })
        .sum()
}

/// Collapses documents sharing a URL, keeping the one with more out-links.
///
/// On a tie the later document wins. Returns the number removed.
fn remove_duplicates(corpus: &mut Corpus) -> usize {
    let total = corpus.len();
    let mut kept: Vec<Document> = Vec::with_capacity(total);
    let mut slot_by_url: HashMap<String, usize> = HashMap::with_capacity(total);

    for doc in std::mem::take(corpus).into_documents() {
        match slot_by_url.get(&doc.url) {
            Some(&slot) => {
                if kept[slot].links_out.len() <= doc.links_out.len() {
                    debug!("Replacing duplicate {} with {}", kept[slot].path, doc.path);
                    kept[slot] = doc;
                } else {
                    debug!("Dropping duplicate {}", doc.path);
                }
            }
            None => {
                slot_by_url.insert(doc.url.clone(), kept.len());
                kept.push(doc);
            }
        }
    }

    let removed = total - kept.len();
    corpus.replace_documents(kept);
    removed
}

/// Derives `links_in` and `links_in_keywords` from every document's `links_out`.
fn add_links_in(corpus: &mut Corpus) -> Result<(), GraphError> {
    let mut inbound: Vec<Vec<Link>> = vec![Vec::new(); corpus.len()];

    for doc in corpus.iter() {
        for link in &doc.links_out {
            let target = corpus
                .index_of(&link.url)
                .ok_or_else(|| GraphError::UnknownTarget {
                    source_url: doc.url.clone(),
                    target_url: link.url.clone(),
                })?;
            inbound[target].push(Link::new(doc.url.clone(), link.text.clone()));
        }
    }

    for (doc, links_in) in corpus.documents_mut().iter_mut().zip(inbound) {
        doc.links_in_keywords = join_anchor_texts(&links_in);
        doc.links_in = links_in;
    }
    Ok(())
}

/// Joins the distinct, non-empty anchor texts in first-seen order.
///
/// Commas inside a text become spaces so the joined string splits cleanly.
fn join_anchor_texts(links: &[Link]) -> String {
    let mut seen = HashSet::new();
    links
        .iter()
        .map(|link| link.text.trim())
        .filter(|text| !text.is_empty() && seen.insert(*text))
        .map(|text| text.replace(',', " "))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Gives every dangling document out-links mirroring its in-links.
///
/// Returns `(mirrored, isolated)`: documents that received links and
/// documents with neither in- nor out-links.
fn mirror_dangling(corpus: &mut Corpus) -> (usize, usize) {
    let mut added_inbound: Vec<(usize, Link)> = Vec::new();
    let mut mirrored = 0;
    let mut isolated = 0;

    let snapshot: Vec<(usize, String, Vec<Link>)> = corpus
        .iter()
        .enumerate()
        .filter(|(_, doc)| doc.is_dangling())
        .map(|(idx, doc)| (idx, doc.url.clone(), doc.links_in.clone()))
        .collect();

    for (idx, url, links_in) in snapshot {
        if links_in.is_empty() {
            isolated += 1;
            continue;
        }
        for link in &links_in {
            // Sources of validated in-links are always in the corpus.
            if let Some(source) = corpus.index_of(&link.url) {
                added_inbound.push((source, Link::new(url.clone(), link.text.clone())));
            }
        }
        corpus.documents_mut()[idx].links_out = links_in;
        mirrored += 1;
    }

    let documents = corpus.documents_mut();
    for (source, link) in added_inbound {
        documents[source].links_in.push(link);
    }

    (mirrored, isolated)
}
