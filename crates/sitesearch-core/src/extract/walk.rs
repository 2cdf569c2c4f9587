//! Mirror traversal and parallel extraction.

use super::{ExtractError, HtmlExtractor};
use crate::document::Document;
use crate::progress::{ProgressCounter, ProgressSink};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

const PROGRESS_LABEL: &str = "Parsed files";

/// All `*.html` files below `root`, sorted for a stable document order.
pub fn find_html_files(root: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut errors = 0;
    for entry in WalkDir::new(root).follow_links(false) {
        match entry {
            Ok(entry) => {
                let is_html = entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("html"));
                if entry.file_type().is_file() && is_html {
                    paths.push(entry.into_path());
                }
            }
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                errors += 1;
            }
        }
    }
    if errors > 0 {
        warn!("Encountered {} errors while walking {}", errors, root.display());
    }
    paths.sort();
    paths
}

/// Extracts every page of the mirror at `root`, in parallel.
///
/// Pages that fail extraction are logged at debug level and skipped. The
/// returned documents follow the sorted file order.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn parse_website(
    root: &Path,
    progress: &dyn ProgressSink,
) -> Result<Vec<Document>, ExtractError> {
    if !root.is_dir() {
        return Err(ExtractError::WebsiteDir(root.display().to_string()));
    }
    let extractor = HtmlExtractor::new()?;

    info!("Getting file paths...");
    let files = find_html_files(root);
    info!("Found {} html files", files.len());

    let counter = ProgressCounter::new(files.len(), PROGRESS_LABEL, progress);
    let docs: Vec<Document> = files
        .par_iter()
        .filter_map(|path| {
            let result = extractor.extract_file(root, path);
            counter.tick();
            match result {
                Ok(doc) => Some(doc),
                Err(e) => {
                    debug!("Ignoring file {}: {}", path.display(), e);
                    None
                }
            }
        })
        .collect();

    info!("Successfully parsed {} of {} files", docs.len(), files.len());
    Ok(docs)
}
