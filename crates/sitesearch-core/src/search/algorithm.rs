//! Ranking algorithm selection.

use super::scoring::Weighting;
use super::SearchError;
use crate::config::{FieldBoosts, SearchConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of supported ranking algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RankingAlgorithm {
    /// Raw term frequency
    #[serde(rename = "frequency")]
    Frequency,
    /// Okapi BM25 over the boosted fields
    #[default]
    #[serde(rename = "bm25")]
    Bm25,
    #[serde(rename = "tf_idf")]
    TfIdf,
    /// Poisson model with Laplace after-effect and normalization 2
    #[serde(rename = "pl2")]
    Pl2,
    /// BM25 gates relevance, stored pagerank orders the matches
    #[serde(rename = "pagerank")]
    PageRank,
    /// BM25 candidates re-ranked by a lexical/pagerank blend
    #[serde(rename = "custom")]
    Custom,
}

impl RankingAlgorithm {
    pub const ALL: [RankingAlgorithm; 6] = [
        RankingAlgorithm::Frequency,
        RankingAlgorithm::Bm25,
        RankingAlgorithm::TfIdf,
        RankingAlgorithm::Pl2,
        RankingAlgorithm::PageRank,
        RankingAlgorithm::Custom,
    ];

    /// The key accepted by [`FromStr`].
    pub fn key(self) -> &'static str {
        match self {
            RankingAlgorithm::Frequency => "frequency",
            RankingAlgorithm::Bm25 => "bm25",
            RankingAlgorithm::TfIdf => "tf_idf",
            RankingAlgorithm::Pl2 => "pl2",
            RankingAlgorithm::PageRank => "pagerank",
            RankingAlgorithm::Custom => "custom",
        }
    }

    pub fn keys() -> Vec<&'static str> {
        Self::ALL.iter().map(|algorithm| algorithm.key()).collect()
    }

    /// How this algorithm weighs, boosts and orders matches.
    pub fn plan(self, config: &SearchConfig) -> RankingPlan {
        let (scoring, boosts, order) = match self {
            RankingAlgorithm::Frequency => (
                Scoring::Model(Weighting::Frequency),
                config.field_boosts,
                ResultOrder::Score,
            ),
            RankingAlgorithm::Bm25 => (Scoring::Bm25, config.field_boosts, ResultOrder::Score),
            RankingAlgorithm::TfIdf => (
                Scoring::Model(Weighting::TfIdf),
                config.field_boosts,
                ResultOrder::Score,
            ),
            RankingAlgorithm::Pl2 => (
                Scoring::Model(Weighting::Pl2 {
                    c: f64::from(config.pl2_c),
                }),
                config.field_boosts,
                ResultOrder::Score,
            ),
            RankingAlgorithm::PageRank => {
                (Scoring::Bm25, config.field_boosts, ResultOrder::PageRank)
            }
            RankingAlgorithm::Custom => (Scoring::Bm25, config.custom_boosts, ResultOrder::Blend),
        };
        RankingPlan {
            scoring,
            boosts,
            order,
        }
    }
}

impl FromStr for RankingAlgorithm {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.key() == key)
            .ok_or_else(|| SearchError::InvalidAlgorithm {
                given: s.to_string(),
                valid: Self::keys().into_iter().map(String::from).collect(),
            })
    }
}

impl fmt::Display for RankingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Where the lexical score comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scoring {
    /// tantivy's BM25 with the field boosts
    Bm25,
    /// Matches rescored from their postings with a weighting model
    Model(Weighting),
}

/// Final ordering applied to scored matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultOrder {
    /// Lexical score, descending
    Score,
    /// Stored pagerank, descending, over every match
    PageRank,
    /// Blend of normalized score and log-pagerank over a widened candidate pool
    Blend,
}

/// Resolved strategy for one query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingPlan {
    pub scoring: Scoring,
    pub boosts: FieldBoosts,
    pub order: ResultOrder,
}
