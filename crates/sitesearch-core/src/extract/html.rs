//! Single-page extraction with scraper.

use super::ExtractError;
use crate::document::{canonicalize_url, Document, Link};
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::fs;
use std::path::Path;
use tracing::debug;

const MIRROR_BANNER: &str = r"<!-- Mirrored from (.*?) by HTTrack Website Copier";
const NO_INDEX_REGION: &str = r"(?s)<!--noindex-->.*?<!--endnoindex-->";

/// Elements whose text never counts as page content.
const SKIPPED_ELEMENTS: [&str; 3] = ["script", "style", "iframe"];

/// Minimum counts a real page must exceed; mirrors also contain redirect
/// stubs and error pages.
const MIN_DIVS: usize = 2;
const MIN_HEAD_ELEMENTS: usize = 3;

/// Extracts [`Document`]s from mirrored HTML pages.
///
/// Selectors and patterns are compiled once; an extractor is `Sync` and is
/// shared across the parse workers.
#[derive(Debug)]
pub struct HtmlExtractor {
    mirror_banner: Regex,
    no_index: Regex,
    div: Selector,
    head_elements: Selector,
    title: Selector,
    description: Selector,
    keywords: Selector,
    body: Selector,
    body_links: Selector,
}

impl HtmlExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            mirror_banner: regex(MIRROR_BANNER)?,
            no_index: regex(NO_INDEX_REGION)?,
            div: selector("div")?,
            head_elements: selector("link, script, meta")?,
            title: selector("title")?,
            description: selector(r#"meta[name="description"]"#)?,
            keywords: selector(r#"meta[name="keywords"]"#)?,
            body: selector("body")?,
            body_links: selector("body a[href]")?,
        })
    }

    /// Reads and extracts the page at `path`, recording its path relative
    /// to the mirror `root`.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn extract_file(&self, root: &Path, path: &Path) -> Result<Document, ExtractError> {
        let html = fs::read(path).map_err(|source| ExtractError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let relative = path.strip_prefix(root).unwrap_or(path);
        self.extract_str(
            &relative.display().to_string(),
            &String::from_utf8_lossy(&html),
        )
    }

    /// Extracts a page from its HTML source; `path` is recorded as is.
    pub fn extract_str(&self, path: &str, html: &str) -> Result<Document, ExtractError> {
        let page_url = self.mirror_url(html)?;
        let parsed = Html::parse_document(html);
        self.check_page(&parsed)?;

        let mut doc = Document::new(path, page_url.as_str());
        doc.title = parsed
            .select(&self.title)
            .next()
            .map(|title| clean_text(&title.text().collect::<Vec<_>>().join(" ")))
            .unwrap_or_default();
        doc.description = meta_content(&parsed, &self.description);
        doc.keywords = meta_content(&parsed, &self.keywords);
        doc.links_out = self.links(&parsed, &page_url);

        let indexable = self.no_index.replace_all(html, "");
        let cleaned = Html::parse_document(&indexable);
        doc.content = cleaned
            .select(&self.body)
            .next()
            .map(|body| {
                let mut parts = Vec::new();
                collect_text(body, &mut parts);
                clean_text(&parts.join(" "))
            })
            .unwrap_or_default();

        debug!(
            "Extracted {} ({} links, {} chars)",
            doc.url,
            doc.links_out.len(),
            doc.content.len()
        );
        Ok(doc)
    }

    /// URL from the HTTrack banner, with `http://` assumed when schemeless.
    fn mirror_url(&self, html: &str) -> Result<url::Url, ExtractError> {
        let raw = self
            .mirror_banner
            .captures(html)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().trim())
            .filter(|raw| !raw.is_empty())
            .ok_or(ExtractError::MissingUrl)?;
        let absolute = if raw.starts_with("http") {
            raw.to_string()
        } else {
            format!("http://{}", raw)
        };
        url::Url::parse(&absolute).map_err(|e| ExtractError::InvalidUrl(format!("{}: {}", absolute, e)))
    }

    fn check_page(&self, parsed: &Html) -> Result<(), ExtractError> {
        let divs = parsed.select(&self.div).count();
        if divs <= MIN_DIVS {
            return Err(ExtractError::SanityCheck(format!(
                "only {} div elements",
                divs
            )));
        }
        let head = parsed.select(&self.head_elements).count();
        if head <= MIN_HEAD_ELEMENTS {
            return Err(ExtractError::SanityCheck(format!(
                "only {} link, script or meta elements",
                head
            )));
        }
        Ok(())
    }

    /// Body anchors resolved against the page URL; non-http(s) targets are dropped.
    fn links(&self, parsed: &Html, page_url: &url::Url) -> Vec<Link> {
        parsed
            .select(&self.body_links)
            .filter_map(|anchor| {
                let href = anchor.value().attr("href")?.trim();
                let target = page_url.join(href).ok()?;
                if target.scheme() != "http" && target.scheme() != "https" {
                    return None;
                }
                let text = clean_text(&anchor.text().collect::<Vec<_>>().join(" "));
                Some(Link::new(canonicalize_url(target.as_str()), text))
            })
            .collect()
    }
}

fn regex(pattern: &str) -> Result<Regex, ExtractError> {
    Regex::new(pattern).map_err(|e| ExtractError::Pattern(format!("{}: {}", pattern, e)))
}

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Pattern(format!("{}: {:?}", css, e)))
}

fn meta_content(parsed: &Html, selector: &Selector) -> String {
    parsed
        .select(selector)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default()
}

/// Collects text nodes below `element`, skipping [`SKIPPED_ELEMENTS`].
fn collect_text(element: ElementRef<'_>, parts: &mut Vec<String>) {
    if SKIPPED_ELEMENTS.contains(&element.value().name()) {
        return;
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => parts.push(text.to_string()),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, parts);
                }
            }
            _ => {}
        }
    }
}

/// Replaces stray `&nbsp` entities and collapses whitespace.
pub fn clean_text(text: &str) -> String {
    text.replace("&nbsp", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
