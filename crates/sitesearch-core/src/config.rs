//! Production defaults and runtime configuration.
//!
//! The constants document the defaults the engine ships with; the structs
//! below carry them at runtime and can be deserialized from a config file.
//!
//! # Usage
//!
//! ```
//! use sitesearch_core::config::{EngineConfig, DEFAULT_DAMPING};
//!
//! let config = EngineConfig::default();
//! assert_eq!(config.pagerank.damping, DEFAULT_DAMPING);
//! ```

use crate::graph::DanglingPolicy;
use crate::index::Field;
use serde::{Deserialize, Serialize};

// =============================================================================
// PageRank
// =============================================================================

/// Probability mass retained by the random walker at each step.
pub const DEFAULT_DAMPING: f64 = 0.85;

/// Fixed number of synchronous PageRank iterations.
pub const DEFAULT_EPOCHS: usize = 30;

// =============================================================================
// Lexical scoring
// =============================================================================

/// PL2 term frequency normalization parameter.
pub const PL2_C: f32 = 1.0;

// =============================================================================
// Blended ranking
// =============================================================================

/// Weight of the normalized lexical score in the custom blend.
pub const BLEND_LEXICAL_WEIGHT: f64 = 0.6;

/// Weight of the normalized log-pagerank in the custom blend.
pub const BLEND_PAGERANK_WEIGHT: f64 = 0.4;

/// Minimum number of candidates fetched before the custom blend re-ranks.
///
/// PageRank normalization needs the maximum over the candidate set, so the
/// pool is widened beyond `limit`.
pub const CUSTOM_CANDIDATE_POOL: usize = 100;

/// Engine configuration bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub graph: GraphConfig,
    pub pagerank: PageRankConfig,
    pub search: SearchConfig,
}

/// Link graph construction.
///
/// The dangling policy lives here only: the built graph records it and
/// PageRank reads it back from the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// How documents without out-links are treated
    pub dangling: DanglingPolicy,
}

/// PageRank engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRankConfig {
    /// Iteration count
    pub epochs: usize,
    /// Probability mass retained in the random-walk model
    pub damping: f64,
    /// Stop early once no rank moves by more than this between epochs
    pub tolerance: Option<f64>,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            epochs: DEFAULT_EPOCHS,
            damping: DEFAULT_DAMPING,
            tolerance: None,
        }
    }
}

/// Per-field query boosts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldBoosts {
    pub title: f32,
    pub description: f32,
    pub keywords: f32,
    pub links_in_keywords: f32,
    pub content: f32,
}

impl FieldBoosts {
    /// Equal weight on title, description, keywords and content.
    pub const fn standard() -> Self {
        Self {
            title: 1.0,
            description: 1.0,
            keywords: 1.0,
            links_in_keywords: 0.0,
            content: 1.0,
        }
    }

    /// Title highest, then keywords/description/inbound anchors, content baseline.
    pub const fn blended() -> Self {
        Self {
            title: 4.0,
            description: 2.0,
            keywords: 2.0,
            links_in_keywords: 2.0,
            content: 1.0,
        }
    }

    /// Boost for a text field; `None` for fields that are not searched by default.
    pub fn boost(&self, field: Field) -> Option<f32> {
        let boost = match field {
            Field::Title => self.title,
            Field::Description => self.description,
            Field::Keywords => self.keywords,
            Field::LinksInKeywords => self.links_in_keywords,
            Field::Content => self.content,
            Field::Url | Field::Path => return None,
        };
        (boost > 0.0).then_some(boost)
    }

    /// Text fields searched with a positive boost, in schema order.
    pub fn searched_fields(&self) -> Vec<(Field, f32)> {
        Field::TEXT
            .iter()
            .filter_map(|&field| self.boost(field).map(|boost| (field, boost)))
            .collect()
    }
}

impl Default for FieldBoosts {
    fn default() -> Self {
        Self::standard()
    }
}

/// Weights of the custom blend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendWeights {
    pub lexical: f64,
    pub pagerank: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            lexical: BLEND_LEXICAL_WEIGHT,
            pagerank: BLEND_PAGERANK_WEIGHT,
        }
    }
}

/// Query engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub pl2_c: f32,
    /// Boosts for the frequency, bm25, tf_idf, pl2 and pagerank algorithms
    pub field_boosts: FieldBoosts,
    /// Boosts for the custom blend's candidate fetch
    pub custom_boosts: FieldBoosts,
    pub blend: BlendWeights,
    pub candidate_pool: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            pl2_c: PL2_C,
            field_boosts: FieldBoosts::standard(),
            custom_boosts: FieldBoosts::blended(),
            blend: BlendWeights::default(),
            candidate_pool: CUSTOM_CANDIDATE_POOL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_weights_sum_to_one() {
        let weights = BlendWeights::default();
        assert!((weights.lexical + weights.pagerank - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_standard_boosts_skip_inbound_anchors() {
        let fields: Vec<Field> = FieldBoosts::standard()
            .searched_fields()
            .into_iter()
            .map(|(field, _)| field)
            .collect();
        assert_eq!(
            fields,
            vec![
                Field::Title,
                Field::Description,
                Field::Keywords,
                Field::Content
            ]
        );
    }

    #[test]
    fn test_blended_boosts_rank_title_highest() {
        let boosts = FieldBoosts::blended();
        let title = boosts.boost(Field::Title).unwrap_or_default();
        for (field, boost) in boosts.searched_fields() {
            if field != Field::Title {
                assert!(title > boost, "{:?} should be boosted below title", field);
            }
        }
        assert_eq!(boosts.boost(Field::Url), None);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"pagerank": {"epochs": 5}}"#).unwrap();
        assert_eq!(config.pagerank.epochs, 5);
        assert_eq!(config.pagerank.damping, DEFAULT_DAMPING);
        assert_eq!(config.graph.dangling, DanglingPolicy::MirrorInbound);
        assert_eq!(config.search.candidate_pool, CUSTOM_CANDIDATE_POOL);
    }

    #[test]
    fn test_dangling_policy_is_a_graph_setting() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"graph": {"dangling": "sink"}}"#).unwrap();
        assert_eq!(config.graph.dangling, DanglingPolicy::Sink);
        assert_eq!(config.pagerank, PageRankConfig::default());
    }
}
