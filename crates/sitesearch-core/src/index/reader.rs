//! Read-only access to a committed index.

use super::{
    fingerprint, Analyzer, Field, IndexFields, IndexManifest, INDEX_DIR, SCHEMA_VERSION,
    TEXT_FIELDS,
};
use crate::document::{canonicalize_url, Document};
use crate::error::IndexError;
use std::path::{Path, PathBuf};
use tantivy::collector::TopDocs;
use tantivy::query::TermQuery;
use tantivy::schema::IndexRecordOption;
use tantivy::{DocAddress, Index, IndexReader, ReloadPolicy, Searcher, TantivyDocument, Term};
use tracing::{debug, instrument};

/// tantivy's metadata file, present once an index has been committed.
const META_FILE: &str = "meta.json";

/// An opened index, shared across concurrent queries.
///
/// Average field lengths are computed once on open. Each query takes its
/// own [`Searcher`], a consistent view that stays valid even if a rebuild
/// swaps the directory underneath.
pub struct LexicalIndex {
    index: Index,
    reader: IndexReader,
    fields: IndexFields,
    path: PathBuf,
    manifest: IndexManifest,
    analyzer: Analyzer,
    average_lengths: [f32; TEXT_FIELDS],
}

impl LexicalIndex {
    /// Returns `true` if `dir` holds a committed index.
    pub fn exists(dir: impl AsRef<Path>) -> bool {
        dir.as_ref().join(INDEX_DIR).join(META_FILE).is_file()
    }

    /// Opens the index committed in `dir`.
    ///
    /// Fails with [`IndexError::Missing`] if nothing was indexed there and
    /// with [`IndexError::AnalyzerMismatch`] if the index was built with a
    /// different analyzer or schema version.
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, IndexError> {
        if !Self::exists(&dir) {
            return Err(IndexError::Missing(dir.as_ref().display().to_string()));
        }
        let path = dir.as_ref().join(INDEX_DIR);
        let index = Index::open_in_dir(&path)?;

        let payload = index
            .load_metas()?
            .payload
            .ok_or_else(|| IndexError::Storage("Index manifest is missing".to_string()))?;
        let manifest: IndexManifest = serde_json::from_str(&payload)?;

        let analyzer = Analyzer::english()?;
        let expected = fingerprint(analyzer.name(), SCHEMA_VERSION);
        if manifest.fingerprint() != expected {
            return Err(IndexError::AnalyzerMismatch {
                expected,
                found: manifest.fingerprint(),
            });
        }
        analyzer.register(&index);

        let fields = IndexFields::resolve(&index.schema())?;
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        let average_lengths = average_lengths(&reader.searcher(), &fields)?;

        debug!(
            "Opened index with {} documents built by {}",
            manifest.document_count, manifest.analyzer
        );
        Ok(Self {
            index,
            reader,
            fields,
            path,
            manifest,
            analyzer,
            average_lengths,
        })
    }

    /// Location of the index directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    /// The analyzer query terms must be run through.
    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn document_count(&self) -> usize {
        self.manifest.document_count as usize
    }

    /// Mean analyzed length of `field`; 0 for ID fields and empty indexes.
    pub fn average_field_length(&self, field: Field) -> f32 {
        field
            .text_slot()
            .map(|slot| self.average_lengths[slot])
            .unwrap_or(0.0)
    }

    /// A point-in-time view for one query.
    pub fn searcher(&self) -> Searcher {
        self.reader.searcher()
    }

    pub(crate) fn index(&self) -> &Index {
        &self.index
    }

    pub(crate) fn fields(&self) -> &IndexFields {
        &self.fields
    }

    /// Reconstructs a document from its stored fields.
    ///
    /// `content`, `links_out` and `links_in` are not stored and come back empty.
    pub fn document(&self, searcher: &Searcher, address: DocAddress) -> Result<Document, IndexError> {
        let stored: TantivyDocument = searcher.doc(address)?;
        Ok(self.fields.from_tantivy(&stored))
    }

    /// Exact-match lookup on an ID field. URLs are canonicalized first.
    ///
    /// Analyzed fields never match.
    pub fn lookup(&self, field: Field, value: &str) -> Result<Option<Document>, IndexError> {
        if !field.is_id() {
            return Ok(None);
        }
        let key = match field {
            Field::Url => canonicalize_url(value),
            _ => value.to_string(),
        };
        let term = Term::from_field_text(self.fields.get(field), &key);
        let query = TermQuery::new(term, IndexRecordOption::Basic);

        let searcher = self.searcher();
        let top = searcher.search(&query, &TopDocs::with_limit(1))?;
        match top.first() {
            Some((_, address)) => Ok(Some(self.document(&searcher, *address)?)),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for LexicalIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LexicalIndex")
            .field("path", &self.path)
            .field("manifest", &self.manifest)
            .finish_non_exhaustive()
    }
}

fn average_lengths(
    searcher: &Searcher,
    fields: &IndexFields,
) -> Result<[f32; TEXT_FIELDS], IndexError> {
    let docs = searcher.num_docs();
    let mut averages = [0.0; TEXT_FIELDS];
    if docs == 0 {
        return Ok(averages);
    }
    for (slot, field) in Field::TEXT.into_iter().enumerate() {
        let mut tokens = 0u64;
        for segment in searcher.segment_readers() {
            tokens += segment.inverted_index(fields.get(field))?.total_num_tokens();
        }
        averages[slot] = (tokens as f64 / docs as f64) as f32;
    }
    Ok(averages)
}
