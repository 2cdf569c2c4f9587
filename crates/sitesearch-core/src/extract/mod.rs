//! HTML extraction from an HTTrack website mirror.
//!
//! **Module Organization:**
//! - `html.rs`: Per-page extraction with scraper (URL, metadata, links, body text)
//! - `walk.rs`: Mirror traversal with walkdir and parallel extraction with rayon
//!
//! Extraction failures are local to one page: [`parse_website`] logs them at
//! debug level and skips the page.

mod html;
mod walk;

pub use html::{clean_text, HtmlExtractor};
pub use walk::{find_html_files, parse_website};

use thiserror::Error;

/// Errors raised while extracting a single page.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The page carries no HTTrack "Mirrored from" banner
    #[error("Url not found")]
    MissingUrl,
    /// The mirrored URL could not be parsed
    #[error("Invalid page url {0}")]
    InvalidUrl(String),
    /// The page looks like a stub or an error page
    #[error("Sanity check failed: {0}")]
    SanityCheck(String),
    /// A built-in selector or pattern failed to compile
    #[error("Invalid pattern: {0}")]
    Pattern(String),
    /// The website root does not exist or is not a directory
    #[error("Website directory not found: {0}")]
    WebsiteDir(String),
}
