//! Persistent multi-field lexical index.
//!
//! The index is a tantivy index in `<dir>/lexical/`, written once by an
//! [`IndexWriter`] and read concurrently through a shared [`LexicalIndex`].
//!
//! # Schema
//!
//! | Field               | Kind                                        |
//! |---------------------|---------------------------------------------|
//! | `url`, `path`       | `STRING \| STORED`, exact match only        |
//! | `title`             | analyzed with positions, stored             |
//! | `description`       | analyzed with positions, stored             |
//! | `keywords`          | analyzed with positions, stored             |
//! | `links_in_keywords` | analyzed with positions, stored             |
//! | `content`           | analyzed with positions, not stored         |
//! | `pagerank`          | `f64`, `FAST \| STORED`                     |
//! | `ordinal`           | `u64`, `FAST`: insertion order for tie-breaks |
//!
//! The commit payload in tantivy's `meta.json` carries an [`IndexManifest`]
//! naming the analyzer and schema version the index was built with.

mod analyzer;
mod reader;
mod schema;
mod writer;


pub use analyzer::{Analyzer, ENGLISH_ANALYZER};
pub use reader::LexicalIndex;
pub use writer::{IndexSummary, IndexWriter};

pub(crate) use schema::{IndexFields, ORDINAL_FIELD, PAGERANK_FIELD};

use crate::document::Document;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Directory of a committed index inside the index directory.
pub const INDEX_DIR: &str = "lexical";

/// Directory of an index under construction.
pub(crate) const TEMP_INDEX_DIR: &str = "lexical.building";

/// Where the replaced index waits while the new one is moved in.
pub(crate) const PREVIOUS_INDEX_DIR: &str = "lexical.previous";

/// Bumped whenever the schema or stored encoding changes.
pub const SCHEMA_VERSION: u32 = 2;

/// Dense document number assigned in insertion order.
pub type DocNum = u64;

/// A schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Url,
    Path,
    Title,
    Description,
    Keywords,
    LinksInKeywords,
    Content,
}

/// Number of analyzed text fields.
pub const TEXT_FIELDS: usize = 5;

impl Field {
    /// Analyzed fields, in schema order.
    pub const TEXT: [Field; TEXT_FIELDS] = [
        Field::Title,
        Field::Description,
        Field::Keywords,
        Field::LinksInKeywords,
        Field::Content,
    ];

    pub const ALL: [Field; 7] = [
        Field::Url,
        Field::Path,
        Field::Title,
        Field::Description,
        Field::Keywords,
        Field::LinksInKeywords,
        Field::Content,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Url => "url",
            Field::Path => "path",
            Field::Title => "title",
            Field::Description => "description",
            Field::Keywords => "keywords",
            Field::LinksInKeywords => "links_in_keywords",
            Field::Content => "content",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.name() == name)
    }

    /// `true` for the exact-match unique key fields.
    pub fn is_id(self) -> bool {
        matches!(self, Field::Url | Field::Path)
    }

    /// Position of an analyzed field within [`Field::TEXT`].
    pub fn text_slot(self) -> Option<usize> {
        Field::TEXT.iter().position(|&field| field == self)
    }

    /// `false` for `content`, which is indexed but not stored.
    pub fn is_stored(self) -> bool {
        self != Field::Content
    }

    /// The document's raw value for this field.
    pub fn value_of(self, doc: &Document) -> &str {
        match self {
            Field::Url => &doc.url,
            Field::Path => &doc.path,
            Field::Title => &doc.title,
            Field::Description => &doc.description,
            Field::Keywords => &doc.keywords,
            Field::LinksInKeywords => &doc.links_in_keywords,
            Field::Content => &doc.content,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Index-level metadata, checked on open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub schema_version: u32,
    /// Name of the analyzer terms were produced with
    pub analyzer: String,
    pub document_count: u64,
    /// Unix timestamp (seconds) of the build
    pub created_at: u64,
}

impl IndexManifest {
    pub(crate) fn new(analyzer: &str) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            analyzer: analyzer.to_string(),
            document_count: 0,
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or(0),
        }
    }

    /// Identifier compared on open; covers both analyzer and schema layout.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.analyzer, self.schema_version)
    }
}

pub(crate) fn fingerprint(analyzer: &str, schema_version: u32) -> String {
    format!("{}/schema-v{}", analyzer, schema_version)
}
