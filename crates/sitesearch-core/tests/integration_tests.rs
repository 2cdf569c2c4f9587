//! End-to-end integration tests for the indexing and search pipeline.
//!
//! These tests exercise the full workflow:
//! 1. Indexing: HTML extraction → link graph → PageRank → lexical index
//! 2. Search: query parsing → per-algorithm scoring → ordering → documents
//!
//! Run with: `cargo test -p sitesearch-core --test integration_tests`

use sitesearch_core::pipeline::Pipeline;
use sitesearch_core::search::SearchRequest;
use sitesearch_core::{
    Document, EngineConfig, RankingAlgorithm, SearchConfig, SearchEngine, SearchError,
};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

// ============================================================================
// Test Fixtures
// ============================================================================

/// Writes an HTTrack-style mirrored page to `root/relative`.
fn write_page(root: &Path, relative: &str, url: &str, title: &str, body: &str) {
    let html = format!(
        r#"<!DOCTYPE html>
<!-- Mirrored from {url} by HTTrack Website Copier/3.x [XR&CO'2014] -->
<html>
<head>
  <title>{title}</title>
  <meta name="description" content="{title} at Example University">
  <meta name="keywords" content="{title}">
  <link rel="stylesheet" href="/style.css">
  <script src="/site.js"></script>
</head>
<body>
  <div class="page"><div class="main"><div class="inner">
    <!--noindex--><nav>Menu Home Fees Library</nav><!--endnoindex-->
    {body}
  </div></div></div>
</body>
</html>"#
    );
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, html).unwrap();
}

/// A small university mirror: a home page, two topical pages and a stub.
fn write_mirror(root: &Path) {
    write_page(
        root,
        "www.example.org/index.html",
        "www.example.org/",
        "Welcome",
        r#"<p>Welcome to Example University.</p>
           <a href="study/fees/">Tuition fees</a>
           <a href="library/">Library services</a>"#,
    );
    write_page(
        root,
        "www.example.org/study/fees/index.html",
        "www.example.org/study/fees/",
        "Tuition fees",
        r#"<p>Tuition fees for undergraduate and postgraduate students.</p>
           <p>Scholarships reduce fees for eligible applicants.</p>
           <a href="../../">Home</a>
           <a href="../../library/">Library</a>"#,
    );
    write_page(
        root,
        "www.example.org/library/index.html",
        "www.example.org/library/",
        "Library",
        r#"<p>Borrow books and journals. Late returns incur small fees.</p>
           <a href="https://www.example.org/">Home</a>
           <a href="https://elsewhere.org/catalogue">External catalogue</a>"#,
    );
    // Redirect stub without the page furniture of a real page
    fs::write(
        root.join("www.example.org/moved.html"),
        "<!-- Mirrored from www.example.org/moved by HTTrack Website Copier -->\
         <html><body>Moved</body></html>",
    )
    .unwrap();
}

fn urls(docs: &[Document]) -> Vec<&str> {
    docs.iter().map(|doc| doc.url.as_str()).collect()
}

/// Mirrors, indexes and opens the fixture site.
fn indexed_mirror() -> (TempDir, SearchEngine) {
    let temp_dir = TempDir::new().unwrap();
    let website = temp_dir.path().join("website");
    let index = temp_dir.path().join("index");
    write_mirror(&website);

    Pipeline::new(EngineConfig::default())
        .run(&website, &index)
        .unwrap();
    let engine = SearchEngine::open(&index, SearchConfig::default()).unwrap();
    (temp_dir, engine)
}

// ============================================================================
// Indexing
// ============================================================================

#[test]
fn test_mirror_run_skips_stub_pages() {
    let temp_dir = TempDir::new().unwrap();
    let website = temp_dir.path().join("website");
    write_mirror(&website);

    let report = Pipeline::new(EngineConfig::default())
        .run(&website, temp_dir.path().join("index"))
        .unwrap();

    assert_eq!(report.parsed_documents, 3);
    assert_eq!(report.unique_documents, 3);
    // home→fees, home→library, fees→home, fees→library, library→home
    assert_eq!(report.edges, 5);
    assert!(report.pagerank.conservation_error() < 1e-6);
    assert!(report.index_path.is_dir());
}

#[test]
fn test_reindex_replaces_previous_index() {
    let temp_dir = TempDir::new().unwrap();
    let index = temp_dir.path().join("index");
    let pipeline = Pipeline::new(EngineConfig::default());

    pipeline
        .rank_and_index(
            vec![Document::new("old.html", "example.org/old").with_title("Archive")],
            &index,
        )
        .unwrap();
    pipeline
        .rank_and_index(
            vec![Document::new("new.html", "example.org/new").with_title("Prospectus")],
            &index,
        )
        .unwrap();

    let engine = SearchEngine::open(&index, SearchConfig::default()).unwrap();
    assert!(engine
        .search("archive", 10, RankingAlgorithm::Bm25)
        .unwrap()
        .is_empty());
    let found = engine
        .search("prospectus", 10, RankingAlgorithm::Bm25)
        .unwrap();
    assert_eq!(urls(&found), vec!["example.org/new"]);
}

// ============================================================================
// Search
// ============================================================================

#[test]
fn test_every_algorithm_searches_the_mirror() {
    let (_dir, engine) = indexed_mirror();

    for algorithm in RankingAlgorithm::ALL {
        let results = engine.search("fees", 10, algorithm).unwrap();
        let mut found = urls(&results);
        found.sort_unstable();
        assert_eq!(
            found,
            vec![
                "www.example.org",
                "www.example.org/library",
                "www.example.org/study/fees"
            ],
            "{} returned a different match set",
            algorithm
        );
    }

    let bm25 = engine.search("fees", 1, RankingAlgorithm::Bm25).unwrap();
    assert_eq!(urls(&bm25), vec!["www.example.org/study/fees"]);
}

#[test]
fn test_noindex_regions_are_not_searchable() {
    let (_dir, engine) = indexed_mirror();
    let results = engine.search("menu", 10, RankingAlgorithm::Bm25).unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_inbound_anchor_text_is_searchable() {
    let (_dir, engine) = indexed_mirror();
    let results = engine
        .search("links_in_keywords:services", 10, RankingAlgorithm::Bm25)
        .unwrap();
    assert_eq!(urls(&results), vec!["www.example.org/library"]);
}

#[test]
fn test_document_round_trip_by_url() {
    let (_dir, engine) = indexed_mirror();
    let results = engine
        .search(
            r#"url:"http://www.example.org/study/fees/""#,
            10,
            RankingAlgorithm::Bm25,
        )
        .unwrap();

    assert_eq!(results.len(), 1);
    let doc = &results[0];
    assert_eq!(doc.title, "Tuition fees");
    assert_eq!(doc.description, "Tuition fees at Example University");
    assert!(doc.links_in_keywords.contains("Tuition fees"));
    assert!(doc.pagerank > 0.0);
}

#[test]
fn test_unknown_algorithm_lists_valid_keys() {
    let err = "vector".parse::<RankingAlgorithm>().unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Invalid ranking algorithm: vector."));
    for key in RankingAlgorithm::keys() {
        assert!(message.contains(key), "{} missing from {}", key, message);
    }
}

#[test]
fn test_custom_blend_lifts_authoritative_pages() {
    // Both scholarship pages match identically; only inbound links differ.
    let mut docs = vec![
        Document::new("a.html", "example.org/scholarships/a")
            .with_title("Scholarship alpha")
            .with_content("Scholarship for first year students."),
        Document::new("b.html", "example.org/scholarships/b")
            .with_title("Scholarship beta")
            .with_content("Scholarship for first year students."),
    ];
    for hub in 0..4 {
        docs.push(
            Document::new(format!("hub{}.html", hub), &format!("example.org/hub{}", hub))
                .with_title(format!("Hub {}", hub))
                .link_to("example.org/scholarships/b", "Read more"),
        );
    }

    let temp_dir = TempDir::new().unwrap();
    Pipeline::new(EngineConfig::default())
        .rank_and_index(docs, temp_dir.path())
        .unwrap();
    let engine = SearchEngine::open(temp_dir.path(), SearchConfig::default()).unwrap();

    let bm25 = engine
        .search("scholarship", 10, RankingAlgorithm::Bm25)
        .unwrap();
    assert_eq!(
        urls(&bm25),
        vec!["example.org/scholarships/a", "example.org/scholarships/b"]
    );

    let custom = engine
        .search_hits("scholarship", 10, RankingAlgorithm::Custom)
        .unwrap();
    assert_eq!(custom[0].document.url, "example.org/scholarships/b");
    assert!((custom[0].score - 1.0).abs() < 1e-9);
    assert!(custom[1].score < custom[0].score);
}

#[test]
fn test_generous_deadline_completes() {
    let (_dir, engine) = indexed_mirror();
    let request = SearchRequest::new("library", 10, RankingAlgorithm::Pl2)
        .with_timeout(Duration::from_secs(30));
    let hits = engine.search_request(&request).unwrap();
    assert!(!hits.is_empty());
}

#[test]
fn test_search_before_indexing() {
    let temp_dir = TempDir::new().unwrap();
    let err = SearchEngine::open(temp_dir.path(), SearchConfig::default()).unwrap_err();
    assert!(matches!(err, SearchError::IndexMissing(_)));
    assert!(err.to_string().contains("Indexing must run before searching"));
}

#[test]
fn test_clones_serve_concurrent_readers() {
    let (_dir, engine) = indexed_mirror();
    let expected = urls(&engine.search("fees", 10, RankingAlgorithm::TfIdf).unwrap())
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            std::thread::spawn(move || {
                engine
                    .search("fees", 10, RankingAlgorithm::TfIdf)
                    .unwrap()
                    .into_iter()
                    .map(|doc| doc.url)
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
