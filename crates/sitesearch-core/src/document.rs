//! Document record and the URL-keyed corpus arena.
//!
//! A [`Document`] is created once per parse pass, mutated in place by link
//! validation, inbound-link aggregation and PageRank, then handed to the
//! index writer. The [`Corpus`] owns the full collection for one run and
//! addresses documents by position so the link graph can refer to them with
//! plain indices.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default authority score every document starts from.
pub const DEFAULT_PAGERANK: f64 = 1.0;

/// A hyperlink endpoint paired with its anchor text.
///
/// In `links_out` the URL is the target, in `links_in` it is the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub text: String,
}

impl Link {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
        }
    }
}

/// A parsed page of the mirrored website.
///
/// Identity is the canonical `url` (see [`canonicalize_url`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Source file the page was extracted from (informational)
    pub path: String,
    /// Canonical URL of the page
    pub url: String,
    pub title: String,
    pub description: String,
    /// Free-text keywords from the page's meta tag
    pub keywords: String,
    /// Extracted body text
    pub content: String,
    /// Outbound links; restricted to internal documents after graph building
    pub links_out: Vec<Link>,
    /// Inbound links, derived by the graph builder
    pub links_in: Vec<Link>,
    /// Distinct anchor texts of inbound links, comma-joined
    pub links_in_keywords: String,
    /// Authority score
    pub pagerank: f64,
}

impl Document {
    /// Creates an empty document with the given source path and URL.
    ///
    /// The URL is canonicalized.
    pub fn new(path: impl Into<String>, url: &str) -> Self {
        Self {
            path: path.into(),
            url: canonicalize_url(url),
            title: String::new(),
            description: String::new(),
            keywords: String::new(),
            content: String::new(),
            links_out: Vec::new(),
            links_in: Vec::new(),
            links_in_keywords: String::new(),
            pagerank: DEFAULT_PAGERANK,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = keywords.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Appends an outbound link; the target URL is canonicalized.
    pub fn link_to(mut self, target: &str, text: impl Into<String>) -> Self {
        self.links_out.push(Link::new(canonicalize_url(target), text));
        self
    }

    /// Returns `true` if the document has no outbound links.
    pub fn is_dangling(&self) -> bool {
        self.links_out.is_empty()
    }
}

/// Canonicalizes a URL into the document identity form.
///
/// Strips the scheme prefix, the fragment and any trailing slashes:
/// `https://www.example.org/a/#top` becomes `www.example.org/a`.
pub fn canonicalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_fragment = match trimmed.find('#') {
        Some(pos) => &trimmed[..pos],
        None => trimmed,
    };
    let without_scheme = match without_fragment.find("://") {
        Some(pos)
            if without_fragment[..pos]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) =>
        {
            &without_fragment[pos + 3..]
        }
        _ => without_fragment,
    };
    without_scheme.trim_end_matches('/').to_string()
}

/// Arena of documents addressed by position, with a URL lookup.
///
/// Lookups by URL resolve to the first document registered under that URL
/// until the graph builder collapses duplicates.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    by_url: HashMap<String, usize>,
}

impl Corpus {
    pub fn new(documents: Vec<Document>) -> Self {
        let mut corpus = Self {
            documents,
            by_url: HashMap::new(),
        };
        corpus.reindex();
        corpus
    }

    /// Rebuilds the URL lookup after the document vector changed shape.
    pub(crate) fn reindex(&mut self) {
        self.by_url.clear();
        for (idx, doc) in self.documents.iter().enumerate() {
            self.by_url.entry(doc.url.clone()).or_insert(idx);
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn index_of(&self, url: &str) -> Option<usize> {
        self.by_url.get(url).copied()
    }

    pub fn get(&self, url: &str) -> Option<&Document> {
        self.index_of(url).map(|idx| &self.documents[idx])
    }

    pub fn contains(&self, url: &str) -> bool {
        self.by_url.contains_key(url)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub(crate) fn documents_mut(&mut self) -> &mut [Document] {
        &mut self.documents
    }

    pub(crate) fn replace_documents(&mut self, documents: Vec<Document>) {
        self.documents = documents;
        self.reindex();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    /// Sum of all pageranks; approximates [`len`](Self::len) after convergence.
    pub fn rank_sum(&self) -> f64 {
        self.documents.iter().map(|doc| doc.pagerank).sum()
    }

    /// Resets every pagerank to the default seed.
    pub fn reset_pageranks(&mut self) {
        for doc in &mut self.documents {
            doc.pagerank = DEFAULT_PAGERANK;
        }
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }
}

impl From<Vec<Document>> for Corpus {
    fn from(documents: Vec<Document>) -> Self {
        Self::new(documents)
    }
}
