//! Term weighting models the index library does not ship.
//!
//! BM25 comes from tantivy's own scorer. The models here score one term in
//! one field of one document from the term frequency, the field length and
//! the collection statistics read out of the index. Field boosts are applied
//! by the caller.

use std::f64::consts::{LN_2, PI};

/// Collection statistics of one term in one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermStats {
    /// Documents in the index
    pub doc_count: f64,
    /// Documents whose field contains the term
    pub doc_freq: f64,
    /// Occurrences of the term in the field across the collection
    pub coll_freq: f64,
    /// Mean analyzed length of the field
    pub avg_field_length: f64,
}

/// A weighting model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Weighting {
    /// Score is the term frequency
    Frequency,
    /// `tf * (ln(N / (df + 1)) + 1)`
    TfIdf,
    /// Divergence from randomness: Poisson, Laplace after-effect, normalization 2
    Pl2 { c: f64 },
}

impl Weighting {
    /// Weight of a term occurring `tf` times in a field of `field_length` terms.
    pub fn score(&self, tf: f64, field_length: f64, stats: &TermStats) -> f64 {
        if tf <= 0.0 {
            return 0.0;
        }
        match *self {
            Weighting::Frequency => tf,
            Weighting::TfIdf => tf * tf_idf_idf(stats),
            Weighting::Pl2 { c } => pl2(tf, field_length, stats, c),
        }
    }
}

fn tf_idf_idf(stats: &TermStats) -> f64 {
    (stats.doc_count / (stats.doc_freq + 1.0)).ln() + 1.0
}

fn pl2(tf: f64, field_length: f64, stats: &TermStats, c: f64) -> f64 {
    if field_length <= 0.0 || stats.doc_count <= 0.0 || stats.coll_freq <= 0.0 {
        return 0.0;
    }
    let log2 = |x: f64| x.log2();
    // Normalisation 2
    let tfn = tf * log2(1.0 + c * stats.avg_field_length / field_length);
    if tfn <= 0.0 {
        return 0.0;
    }
    let norm = 1.0 / (tfn + 1.0);
    let f = stats.coll_freq / stats.doc_count;
    norm * (tfn * log2(1.0 / f)
        + f / LN_2
        + 0.5 * log2(2.0 * PI * tfn)
        + tfn * (log2(tfn) - 1.0 / LN_2))
}
