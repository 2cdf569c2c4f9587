//! Single-writer index build.

use super::{
    Analyzer, DocNum, Field, IndexFields, IndexManifest, INDEX_DIR, PREVIOUS_INDEX_DIR,
    TEMP_INDEX_DIR,
};
use crate::document::Document;
use crate::error::IndexError;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tantivy::{Index, TantivyError};
use tracing::{debug, info, instrument, warn};

/// Memory budget of the single indexing thread.
const WRITER_MEMORY_BUDGET: usize = 50_000_000;

/// Counts reported by a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSummary {
    pub documents: usize,
    /// The committed index directory
    pub path: PathBuf,
}

/// Builds a fresh index in `lexical.building/` and swaps it in on commit.
///
/// Until the final rename the previously committed `lexical/`, if any,
/// stays untouched and searchable. Dropping a writer without committing
/// discards the build. tantivy's writer lock on the build directory keeps a
/// second builder out, in this process or another.
pub struct IndexWriter {
    dir: PathBuf,
    build_dir: PathBuf,
    writer: Option<tantivy::IndexWriter>,
    fields: IndexFields,
    manifest: IndexManifest,
    urls: HashSet<String>,
    paths: HashSet<String>,
    count: usize,
}

impl IndexWriter {
    /// Starts a build in `dir`, creating the directory if needed.
    ///
    /// Fails if another writer is building into the same directory. A build
    /// left behind by an interrupted run is removed.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self, IndexError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let build_dir = dir.join(TEMP_INDEX_DIR);
        if build_dir.exists() {
            reset_stale_build(&build_dir)?;
        }
        fs::create_dir_all(&build_dir)?;

        let (schema, fields) = IndexFields::build();
        let index = Index::create_in_dir(&build_dir, schema)?;
        let analyzer = Analyzer::english()?;
        analyzer.register(&index);
        let writer = index.writer_with_num_threads(1, WRITER_MEMORY_BUDGET)?;
        debug!("Building index in {}", build_dir.display());

        Ok(Self {
            dir,
            build_dir,
            writer: Some(writer),
            fields,
            manifest: IndexManifest::new(analyzer.name()),
            urls: HashSet::new(),
            paths: HashSet::new(),
            count: 0,
        })
    }

    /// Number of documents added so far.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Queues one document for indexing.
    ///
    /// `url` and `path` are unique keys; a repeat fails with
    /// [`IndexError::DuplicateKey`] and leaves the writer unchanged.
    pub fn add(&mut self, doc: &Document) -> Result<DocNum, IndexError> {
        if self.urls.contains(&doc.url) {
            return Err(IndexError::DuplicateKey {
                field: Field::Url.name(),
                value: doc.url.clone(),
            });
        }
        if self.paths.contains(&doc.path) {
            return Err(IndexError::DuplicateKey {
                field: Field::Path.name(),
                value: doc.path.clone(),
            });
        }

        let writer = self
            .writer
            .as_ref()
            .ok_or_else(|| IndexError::Storage("Index writer already finished".to_string()))?;
        let num = self.count as DocNum;
        writer.add_document(self.fields.to_tantivy(doc, num))?;

        self.urls.insert(doc.url.clone());
        self.paths.insert(doc.path.clone());
        self.count += 1;
        Ok(num)
    }

    /// Commits the build and atomically replaces `lexical/`.
    ///
    /// On failure the build directory is removed and the previous index,
    /// if any, is left as it was.
    #[instrument(skip_all, fields(documents = self.count))]
    pub fn commit(mut self) -> Result<IndexSummary, IndexError> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| IndexError::Storage("Index writer already finished".to_string()))?;
        self.manifest.document_count = self.count as u64;

        let target = self.dir.join(INDEX_DIR);
        let outcome = commit_writer(writer, &self.manifest).and_then(|()| self.swap_in(&target));
        if let Err(e) = outcome {
            self.discard_build();
            return Err(e);
        }

        let summary = IndexSummary {
            documents: self.count,
            path: target,
        };
        info!(
            "Indexed {} documents into {}",
            summary.documents,
            summary.path.display()
        );
        Ok(summary)
    }

    /// Moves the finished build into place, keeping the old index until
    /// the new one is there.
    fn swap_in(&self, target: &Path) -> Result<(), IndexError> {
        let previous = self.dir.join(PREVIOUS_INDEX_DIR);
        if previous.exists() {
            fs::remove_dir_all(&previous)?;
        }
        let replacing = target.exists();
        if replacing {
            fs::rename(target, &previous)?;
        }
        if let Err(e) = fs::rename(&self.build_dir, target) {
            if replacing {
                if let Err(restore) = fs::rename(&previous, target) {
                    warn!(
                        "Failed to restore previous index {}: {}",
                        previous.display(),
                        restore
                    );
                }
            }
            return Err(e.into());
        }
        if replacing {
            if let Err(e) = fs::remove_dir_all(&previous) {
                warn!("Failed to remove replaced index {}: {}", previous.display(), e);
            }
        }
        Ok(())
    }

    fn discard_build(&self) {
        if let Err(e) = fs::remove_dir_all(&self.build_dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    "Failed to remove index build {}: {}",
                    self.build_dir.display(),
                    e
                );
            }
        }
    }
}

impl Drop for IndexWriter {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            // Releases the directory lock before the files go.
            drop(writer);
            debug!("Discarding uncommitted index build");
            self.discard_build();
        }
    }
}

fn commit_writer(
    mut writer: tantivy::IndexWriter,
    manifest: &IndexManifest,
) -> Result<(), IndexError> {
    let payload = serde_json::to_string(manifest)?;
    let mut prepared = writer.prepare_commit()?;
    prepared.set_payload(&payload);
    prepared.commit()?;
    writer.wait_merging_threads()?;
    debug!("Committed index {}", manifest.fingerprint());
    Ok(())
}

/// Clears a build directory nobody is writing to.
fn reset_stale_build(build_dir: &Path) -> Result<(), IndexError> {
    if let Ok(index) = Index::open_in_dir(build_dir) {
        match index.writer_with_num_threads::<tantivy::TantivyDocument>(1, WRITER_MEMORY_BUDGET) {
            Err(TantivyError::LockFailure(..)) => {
                return Err(IndexError::Storage(format!(
                    "Another build is already writing to {}",
                    build_dir.display()
                )));
            }
            // An uncommitted writer is dropped here and releases the lock.
            _ => {}
        }
    }
    debug!("Removing stale index build {}", build_dir.display());
    fs::remove_dir_all(build_dir)?;
    Ok(())
}
