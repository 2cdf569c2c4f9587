//! Ranked retrieval over the lexical index.
//!
//! A query is parsed by [`query`], rendered for tantivy's `QueryParser`
//! over the plan's boosted fields, and every match is collected. Matches
//! are then weighted and ordered as the chosen [`RankingAlgorithm`] plans:
//!
//! | Algorithm   | Weighting         | Fields    | Final order                          |
//! |-------------|-------------------|-----------|--------------------------------------|
//! | `frequency` | tf, rescored      | standard  | score                                |
//! | `bm25`      | tantivy BM25      | standard  | score                                |
//! | `tf_idf`    | TF-IDF, rescored  | standard  | score                                |
//! | `pl2`       | PL2, rescored     | standard  | score                                |
//! | `pagerank`  | tantivy BM25      | standard  | stored pagerank over all matches     |
//! | `custom`    | tantivy BM25      | blended   | lexical/pagerank blend of candidates |

mod algorithm;
mod blend;
mod collector;
mod engine;
pub mod query;
pub mod scoring;
mod types;

#[cfg(test)]
mod tests;

pub use algorithm::{RankingAlgorithm, RankingPlan, ResultOrder, Scoring};
pub use blend::blend_score;
pub use engine::SearchEngine;
pub use types::{SearchError, SearchHit, SearchRequest};
