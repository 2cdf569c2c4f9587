//! Lexical/pagerank blend used by the `custom` algorithm.

use crate::config::BlendWeights;
use crate::index::DocNum;
use tantivy::DocAddress;

/// Combines a lexical score with a pagerank, each normalized against the
/// maximum over the candidate set.
///
/// ```text
/// w_lex * score / max_score + w_pr * log10(pr + 1) / log10(max_pr + 1)
/// ```
///
/// A zero (or negative) denominator makes its component 0.
pub fn blend_score(
    score: f64,
    max_score: f64,
    pagerank: f64,
    max_pagerank: f64,
    weights: BlendWeights,
) -> f64 {
    let lexical = if max_score > 0.0 {
        score / max_score
    } else {
        0.0
    };
    let pr_norm = (max_pagerank.max(0.0) + 1.0).log10();
    let authority = if pr_norm > 0.0 {
        (pagerank.max(0.0) + 1.0).log10() / pr_norm
    } else {
        0.0
    };
    weights.lexical * lexical + weights.pagerank * authority
}

/// A scored match awaiting final ordering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Candidate {
    pub address: DocAddress,
    /// Insertion order, the final tie-break
    pub doc: DocNum,
    pub score: f64,
    pub pagerank: f64,
}

/// Replaces every candidate's score with its blended score and re-sorts.
///
/// Ties keep the incoming order.
pub(crate) fn blend_candidates(candidates: &mut [Candidate], weights: BlendWeights) {
    let max_score = candidates.iter().map(|c| c.score).fold(0.0, f64::max);
    let max_pagerank = candidates.iter().map(|c| c.pagerank).fold(0.0, f64::max);

    for candidate in candidates.iter_mut() {
        candidate.score = blend_score(
            candidate.score,
            max_score,
            candidate.pagerank,
            max_pagerank,
            weights,
        );
    }
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
}
