use super::*;
use crate::config::SearchConfig;
use crate::document::{Corpus, Document};
use crate::graph::{GraphBuilder, PageRank};
use crate::index::IndexWriter;
use crate::progress::NoopProgress;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn university() -> Vec<Document> {
    vec![
        Document::new("index.html", "http://example.org/")
            .with_title("Welcome")
            .with_content("Welcome to the university. Find fees and library information.")
            .link_to("http://example.org/fees", "Fees")
            .link_to("http://example.org/library", "Library")
            .link_to("http://example.org/about", "Our history"),
        Document::new("fees.html", "http://example.org/fees")
            .with_title("Tuition fees")
            .with_description("Fees and funding")
            .with_keywords("fees, funding")
            .with_content("Tuition fees for undergraduate students. Fees are due each term.")
            .link_to("http://example.org/", "Home"),
        Document::new("library.html", "http://example.org/library")
            .with_title("Library")
            .with_content("Library opening hours. Borrow books. Fees for late returns.")
            .link_to("http://example.org/", "Home")
            .link_to("http://example.org/fees", "Fees"),
        Document::new("about.html", "http://example.org/about")
            .with_title("About")
            .with_content("About the university and its history.")
            .link_to("http://example.org/", "Home"),
    ]
}

/// Ranks and indexes `docs`, returning the index directory and an engine.
fn engine_for(docs: Vec<Document>) -> (TempDir, SearchEngine) {
    let temp_dir = TempDir::new().unwrap();
    let mut corpus = Corpus::new(docs);
    let graph = GraphBuilder::default().build(&mut corpus).unwrap();
    PageRank::default()
        .compute(&mut corpus, &graph, &NoopProgress)
        .unwrap();

    let mut writer = IndexWriter::create(temp_dir.path()).unwrap();
    for doc in corpus.iter() {
        writer.add(doc).unwrap();
    }
    writer.commit().unwrap();

    let engine = SearchEngine::open(temp_dir.path(), SearchConfig::default()).unwrap();
    (temp_dir, engine)
}

fn urls(docs: &[Document]) -> Vec<&str> {
    docs.iter().map(|doc| doc.url.as_str()).collect()
}

#[test]
fn test_bm25_prefers_topical_document() {
    let (_dir, engine) = engine_for(university());
    let results = engine.search("fees", 10, RankingAlgorithm::Bm25).unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].url, "example.org/fees");
}

#[test]
fn test_every_algorithm_returns_the_same_matches() {
    let (_dir, engine) = engine_for(university());
    let mut expected = urls(&engine.search("fees", 10, RankingAlgorithm::Bm25).unwrap())
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();
    expected.sort();

    for algorithm in RankingAlgorithm::ALL {
        let results = engine.search("fees", 10, algorithm).unwrap();
        let mut found: Vec<String> = urls(&results).into_iter().map(String::from).collect();
        found.sort();
        assert_eq!(found, expected, "{} returned a different match set", algorithm);
    }
}

#[test]
fn test_scores_are_descending() {
    let (_dir, engine) = engine_for(university());
    for algorithm in [
        RankingAlgorithm::Frequency,
        RankingAlgorithm::Bm25,
        RankingAlgorithm::TfIdf,
        RankingAlgorithm::Pl2,
        RankingAlgorithm::Custom,
    ] {
        let hits = engine.search_hits("fees", 10, algorithm).unwrap();
        assert!(
            hits.windows(2).all(|pair| pair[0].score >= pair[1].score),
            "{} hits out of order",
            algorithm
        );
    }
}

#[test]
fn test_pagerank_orders_by_authority() {
    let (_dir, engine) = engine_for(university());
    let results = engine.search("fees", 10, RankingAlgorithm::PageRank).unwrap();
    assert_eq!(results[0].url, "example.org");
    assert!(results
        .windows(2)
        .all(|pair| pair[0].pagerank >= pair[1].pagerank));
}

#[test]
fn test_pagerank_sorts_all_matches_before_truncating() {
    let (_dir, engine) = engine_for(university());
    let top = engine.search("fees", 1, RankingAlgorithm::PageRank).unwrap();
    assert_eq!(urls(&top), vec!["example.org"]);
}

#[test]
fn test_custom_scores_are_normalized() {
    let (_dir, engine) = engine_for(university());
    let hits = engine
        .search_hits("fees", 10, RankingAlgorithm::Custom)
        .unwrap();
    assert_eq!(hits.len(), 3);
    for hit in &hits {
        assert!(hit.score > 0.0 && hit.score <= 1.0 + 1e-9);
    }
}

#[test]
fn test_no_match_is_empty_not_error() {
    let (_dir, engine) = engine_for(university());
    for algorithm in RankingAlgorithm::ALL {
        assert!(engine.search("zebra", 10, algorithm).unwrap().is_empty());
    }
    assert!(engine.search("the", 10, RankingAlgorithm::Bm25).unwrap().is_empty());
    assert!(engine.search("   ", 10, RankingAlgorithm::Bm25).unwrap().is_empty());
}

#[test]
fn test_limit_truncates() {
    let (_dir, engine) = engine_for(university());
    assert_eq!(engine.search("fees", 2, RankingAlgorithm::Bm25).unwrap().len(), 2);
    assert!(engine.search("fees", 0, RankingAlgorithm::Bm25).unwrap().is_empty());
}

#[test]
fn test_terms_are_anded() {
    let (_dir, engine) = engine_for(university());
    let results = engine
        .search("fees library", 10, RankingAlgorithm::Bm25)
        .unwrap();
    let mut found = urls(&results);
    found.sort();
    assert_eq!(found, vec!["example.org", "example.org/library"]);
}

#[test]
fn test_or_unions_groups() {
    let (_dir, engine) = engine_for(university());
    let results = engine
        .search("history OR tuition", 10, RankingAlgorithm::Bm25)
        .unwrap();
    let mut found = urls(&results);
    found.sort();
    assert_eq!(found, vec!["example.org/about", "example.org/fees"]);
}

#[test]
fn test_fielded_term_restricts_field() {
    let (_dir, engine) = engine_for(university());
    let results = engine
        .search("title:library", 10, RankingAlgorithm::Bm25)
        .unwrap();
    assert_eq!(urls(&results), vec!["example.org/library"]);

    let inbound = engine
        .search("links_in_keywords:history", 10, RankingAlgorithm::Bm25)
        .unwrap();
    assert_eq!(urls(&inbound), vec!["example.org/about"]);
}

#[test]
fn test_url_lookup_round_trips() {
    let (_dir, engine) = engine_for(university());
    let results = engine
        .search("url:https://example.org/fees/", 10, RankingAlgorithm::Bm25)
        .unwrap();
    assert_eq!(results.len(), 1);
    let doc = &results[0];
    assert_eq!(doc.url, "example.org/fees");
    assert_eq!(doc.path, "fees.html");
    assert_eq!(doc.title, "Tuition fees");
    assert_eq!(doc.keywords, "fees, funding");
    assert!(doc.links_in_keywords.contains("Fees"));
    assert!(doc.pagerank > 0.0);
    assert!(doc.content.is_empty());
}

#[test]
fn test_ties_keep_document_order() {
    let docs = vec![
        Document::new("b.html", "example.org/b").with_content("shared words"),
        Document::new("a.html", "example.org/a").with_content("shared words"),
    ];
    let (_dir, engine) = engine_for(docs);
    let results = engine.search("shared", 10, RankingAlgorithm::Bm25).unwrap();
    assert_eq!(urls(&results), vec!["example.org/b", "example.org/a"]);
}

#[test]
fn test_expired_deadline_fails() {
    let (_dir, engine) = engine_for(university());
    let request = SearchRequest::new("fees", 10, RankingAlgorithm::Bm25)
        .with_deadline(Instant::now() - Duration::from_millis(1));
    assert!(matches!(
        engine.search_request(&request),
        Err(SearchError::DeadlineExceeded)
    ));

    let relaxed = SearchRequest::new("fees", 10, RankingAlgorithm::Bm25)
        .with_timeout(Duration::from_secs(60));
    assert_eq!(engine.search_request(&relaxed).unwrap().len(), 3);
}

#[test]
fn test_malformed_query_is_rejected() {
    let (_dir, engine) = engine_for(university());
    let err = engine
        .search("title:\"fees", 10, RankingAlgorithm::Bm25)
        .unwrap_err();
    assert!(matches!(err, SearchError::MalformedQuery(_)));
}

#[test]
fn test_missing_index() {
    let temp_dir = TempDir::new().unwrap();
    let err = SearchEngine::open(temp_dir.path(), SearchConfig::default()).unwrap_err();
    assert!(matches!(err, SearchError::IndexMissing(_)));
    assert!(err.to_string().contains("Indexing must run"));
}

#[test]
fn test_concurrent_queries_share_one_index() {
    let (_dir, engine) = engine_for(university());
    let expected = urls(&engine.search("fees", 10, RankingAlgorithm::Bm25).unwrap())
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let engine = engine.clone();
            let expected = expected.clone();
            scope.spawn(move || {
                for algorithm in RankingAlgorithm::ALL {
                    let results = engine.search("fees", 10, algorithm).unwrap();
                    assert_eq!(results.len(), expected.len());
                }
            });
        }
    });
}

#[test]
fn test_prefix_that_names_no_field_is_text() {
    let docs = vec![
        Document::new("office.html", "example.org/office")
            .with_title("Office")
            .with_content("The office opens at 10:30 on weekdays"),
        Document::new("other.html", "example.org/other").with_content("Closed on weekdays"),
    ];
    let (_dir, engine) = engine_for(docs);

    let results = engine.search("opens 10:30", 10, RankingAlgorithm::Bm25).unwrap();
    assert_eq!(urls(&results), vec!["example.org/office"]);

    let unknown = engine.search("body:office", 10, RankingAlgorithm::Bm25).unwrap();
    assert!(unknown.is_empty());
}

#[test]
fn test_quoted_phrase_needs_adjacent_terms() {
    let (_dir, engine) = engine_for(university());
    let phrase = engine
        .search("\"opening hours\"", 10, RankingAlgorithm::Bm25)
        .unwrap();
    assert_eq!(urls(&phrase), vec!["example.org/library"]);

    let reversed = engine
        .search("\"hours opening\"", 10, RankingAlgorithm::Bm25)
        .unwrap();
    assert!(reversed.is_empty());
}

/// `strong` mentions the term twice, `linked` once but is the target of
/// four hub pages.
fn authority_site() -> Vec<Document> {
    let mut docs = vec![
        Document::new("strong.html", "http://example.org/strong").with_content("harbour harbour"),
        Document::new("linked.html", "http://example.org/linked").with_content("harbour pier"),
    ];
    for n in 0..4 {
        docs.push(
            Document::new(format!("hub{}.html", n), &format!("http://example.org/hub{}", n))
                .with_content("hub page")
                .link_to("http://example.org/linked", "Visit"),
        );
    }
    docs
}

#[test]
fn test_custom_blends_before_truncating() {
    let (_dir, engine) = engine_for(authority_site());

    let lexical = engine.search("harbour", 1, RankingAlgorithm::Bm25).unwrap();
    assert_eq!(urls(&lexical), vec!["example.org/strong"]);

    let blended = engine
        .search_hits("harbour", 1, RankingAlgorithm::Custom)
        .unwrap();
    assert_eq!(blended.len(), 1);
    assert_eq!(blended[0].document.url, "example.org/linked");

    let all = engine
        .search_hits("harbour", 10, RankingAlgorithm::Custom)
        .unwrap();
    assert_eq!(all[0].document.url, "example.org/linked");
    assert!(all[0].score > all[1].score);
}

#[test]
fn test_custom_equal_pagerank_falls_back_to_lexical() {
    let docs = vec![
        Document::new("x.html", "http://example.org/x")
            .with_content("harbour harbour")
            .link_to("http://example.org/y", "Next"),
        Document::new("y.html", "http://example.org/y")
            .with_content("harbour pier")
            .link_to("http://example.org/x", "Next"),
    ];
    let (_dir, engine) = engine_for(docs);

    let results = engine.search("harbour", 10, RankingAlgorithm::Custom).unwrap();
    assert!((results[0].pagerank - results[1].pagerank).abs() < 1e-9);
    assert_eq!(urls(&results), vec!["example.org/x", "example.org/y"]);

    let by_rank = engine.search("harbour", 10, RankingAlgorithm::PageRank).unwrap();
    assert_eq!(urls(&by_rank), vec!["example.org/x", "example.org/y"]);
}

#[test]
fn test_models_rescore_tantivy_matches() {
    let (_dir, engine) = engine_for(authority_site());
    for algorithm in [
        RankingAlgorithm::Frequency,
        RankingAlgorithm::TfIdf,
        RankingAlgorithm::Pl2,
    ] {
        let hits = engine.search_hits("harbour", 10, algorithm).unwrap();
        assert_eq!(hits.len(), 2, "{}", algorithm);
        assert_eq!(hits[0].document.url, "example.org/strong", "{}", algorithm);
    }

    let frequency = engine
        .search_hits("harbour", 10, RankingAlgorithm::Frequency)
        .unwrap();
    assert_eq!(frequency[0].score, 2.0);
    assert_eq!(frequency[1].score, 1.0);
}

#[test]
fn test_top_pagerank_lists_every_document() {
    let (_dir, engine) = engine_for(authority_site());
    let hits = engine.top_pagerank(10).unwrap();
    assert_eq!(hits.len(), 6);
    assert_eq!(hits[0].document.url, "example.org/linked");
    assert!(hits.windows(2).all(|pair| pair[0].score >= pair[1].score));
    assert_eq!(hits[0].score, hits[0].document.pagerank);

    assert_eq!(engine.top_pagerank(2).unwrap().len(), 2);
}
