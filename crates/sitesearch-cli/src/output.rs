//! Output formatting for search results and indexing reports.
//!
//! Supports both human-readable terminal output and JSON for scripting.

use crate::search::SearchOutcome;
use serde::Serialize;
use sitesearch_core::pipeline::PipelineReport;
use sitesearch_core::{RankingAlgorithm, SearchHit};

/// Maximum characters to show of a page's description
const SNIPPET_MAX_LEN: usize = 160;

/// JSON output structure for search results
#[derive(Serialize)]
pub struct JsonOutput {
    pub query: String,
    pub algorithm: RankingAlgorithm,
    pub elapsed_ms: f64,
    pub results: Vec<JsonResult>,
}

#[derive(Serialize)]
pub struct JsonResult {
    pub rank: usize,
    pub url: String,
    pub title: String,
    pub path: String,
    pub score: f64,
    pub pagerank: f64,
}

impl JsonResult {
    fn new(rank: usize, hit: &SearchHit) -> Self {
        Self {
            rank,
            url: hit.document.url.clone(),
            title: hit.document.title.clone(),
            path: hit.document.path.clone(),
            score: hit.score,
            pagerank: hit.document.pagerank,
        }
    }
}

/// Formats search results as JSON.
pub fn format_json(query: &str, algorithm: RankingAlgorithm, outcome: &SearchOutcome) -> String {
    let output = JsonOutput {
        query: query.to_string(),
        algorithm,
        elapsed_ms: outcome.elapsed.as_secs_f64() * 1000.0,
        results: outcome
            .hits
            .iter()
            .enumerate()
            .map(|(i, hit)| JsonResult::new(i + 1, hit))
            .collect(),
    };
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}

/// Formats search results for human-readable terminal output.
pub fn format_human(outcome: &SearchOutcome) -> String {
    let seconds = outcome.elapsed.as_secs_f64();
    if outcome.hits.is_empty() {
        return format!(
            "Your search did not match any documents ({:.3} seconds)",
            seconds
        );
    }

    let mut output = format!(
        "Found {} result{} ({:.3} seconds)\n\n",
        outcome.hits.len(),
        if outcome.hits.len() == 1 { "" } else { "s" },
        seconds
    );

    for (i, hit) in outcome.hits.iter().enumerate() {
        let doc = &hit.document;
        output.push_str(&format!("{}. {} (score: {:.3})\n", i + 1, doc.url, hit.score));
        if !doc.title.is_empty() {
            output.push_str(&format!("   {}\n", doc.title));
        }
        if !doc.description.is_empty() {
            output.push_str(&format!(
                "   {}\n",
                truncate_text(&doc.description, SNIPPET_MAX_LEN)
            ));
        }
        output.push('\n');
    }

    output.trim_end().to_string()
}

/// One `rank. url pagerank` line per document.
pub fn format_pagerank(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "The index holds no documents".to_string();
    }
    hits.iter()
        .enumerate()
        .map(|(i, hit)| format!("{}. {} {:.6}", i + 1, hit.document.url, hit.score))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Summarizes an indexing run.
pub fn format_report(report: &PipelineReport) -> String {
    let mut output = format!(
        "Indexed {} unique documents ({} parsed, {} links) into {}\n\
         PageRank: {} epochs, rank sum {:.3}\n",
        report.unique_documents,
        report.parsed_documents,
        report.edges,
        report.index_path.display(),
        report.pagerank.epochs_run,
        report.pagerank.rank_sum
    );
    output.push_str("Stage run times:\n");
    for timing in &report.stages {
        output.push_str(&format!(
            "  {:<10} {:>10.3}s total\n",
            timing.stage,
            timing.total_ms / 1000.0
        ));
    }
    output.trim_end().to_string()
}

/// Truncates text to a maximum length, adding ellipsis if needed.
fn truncate_text(text: &str, max_len: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_len).collect();
    match truncated.rfind(' ') {
        Some(last_space) => format!("{}...", &truncated[..last_space]),
        None => format!("{}...", truncated),
    }
}
