//! Query execution against a shared lexical index.

use super::algorithm::{RankingPlan, ResultOrder, Scoring};
use super::blend::{blend_candidates, Candidate};
use super::collector::MatchCollector;
use super::query;
use super::scoring::{TermStats, Weighting};
use super::types::check_deadline;
use super::{RankingAlgorithm, SearchError, SearchHit, SearchRequest};
use crate::config::{FieldBoosts, SearchConfig};
use crate::document::Document;
use crate::index::{Field, LexicalIndex};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tantivy::postings::Postings;
use tantivy::query::{AllQuery, Query, QueryParser};
use tantivy::schema::IndexRecordOption;
use tantivy::{DocId, DocSet, Searcher, SegmentOrdinal, Term, TERMINATED};
use tracing::{debug, info, instrument};

/// Candidate positions by segment and segment-local doc id.
type CandidateSlots = HashMap<SegmentOrdinal, HashMap<DocId, usize>>;

/// Ranked retrieval over an opened index.
///
/// Cloning is cheap: clones share the same [`LexicalIndex`], and every
/// query runs on its own tantivy searcher, so a single engine can serve
/// concurrent queries from many threads.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    index: Arc<LexicalIndex>,
    config: SearchConfig,
}

impl SearchEngine {
    /// Opens the index in `index_dir`.
    ///
    /// Fails with [`SearchError::IndexMissing`] if nothing was indexed there.
    pub fn open(index_dir: impl AsRef<Path>, config: SearchConfig) -> Result<Self, SearchError> {
        let index = LexicalIndex::open(index_dir)?;
        Ok(Self::from_index(Arc::new(index), config))
    }

    pub fn from_index(index: Arc<LexicalIndex>, config: SearchConfig) -> Self {
        Self { index, config }
    }

    pub fn index(&self) -> &Arc<LexicalIndex> {
        &self.index
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Returns at most `limit` documents ranked by `algorithm`.
    ///
    /// No match is `Ok(vec![])`, not an error.
    pub fn search(
        &self,
        query: &str,
        limit: usize,
        algorithm: RankingAlgorithm,
    ) -> Result<Vec<Document>, SearchError> {
        Ok(self
            .search_hits(query, limit, algorithm)?
            .into_iter()
            .map(|hit| hit.document)
            .collect())
    }

    /// Like [`search`](Self::search), keeping each document's score.
    pub fn search_hits(
        &self,
        query: &str,
        limit: usize,
        algorithm: RankingAlgorithm,
    ) -> Result<Vec<SearchHit>, SearchError> {
        self.search_request(&SearchRequest::new(query, limit, algorithm))
    }

    /// Runs a full request, honouring its deadline.
    #[instrument(skip_all, fields(algorithm = %request.algorithm, limit = request.limit))]
    pub fn search_request(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, SearchError> {
        let start = Instant::now();
        info!(
            "Received search request: Query: {}\tLimit: {}\tRanking: {}",
            request.query, request.limit, request.algorithm
        );
        check_deadline(request.deadline)?;

        let parsed = query::parse(&request.query)?;
        if parsed.is_empty() || request.limit == 0 {
            return Ok(Vec::new());
        }

        let plan = request.algorithm.plan(&self.config);
        let query = self.query_parser(&plan.boosts).parse_query(&parsed.to_query_string())?;

        let searcher = self.index.searcher();
        let mut candidates = searcher.search(&query, &MatchCollector)?;
        debug!("Matched docs: {}", candidates.len());
        check_deadline(request.deadline)?;

        if let Scoring::Model(weighting) = plan.scoring {
            self.rescore(&searcher, query.as_ref(), &mut candidates, weighting, &plan.boosts)?;
        }
        let candidates = self.order(candidates, &plan, request.limit);
        check_deadline(request.deadline)?;

        let hits = self.materialize(&searcher, candidates)?;
        debug!(
            "Returned {} results in {:.2}ms",
            hits.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(hits)
    }

    /// Every indexed document by stored pagerank, highest first.
    ///
    /// The hit score is the pagerank.
    pub fn top_pagerank(&self, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        let searcher = self.index.searcher();
        let mut candidates = searcher.search(&AllQuery, &MatchCollector)?;
        candidates.sort_by(|a, b| b.pagerank.total_cmp(&a.pagerank).then(a.doc.cmp(&b.doc)));
        candidates.truncate(limit);
        for candidate in candidates.iter_mut() {
            candidate.score = candidate.pagerank;
        }
        self.materialize(&searcher, candidates)
    }

    /// A parser over the plan's searched fields, with their boosts.
    fn query_parser(&self, boosts: &FieldBoosts) -> QueryParser {
        let fields = self.index.fields();
        let searched = boosts.searched_fields();
        let mut parser = QueryParser::for_index(
            self.index.index(),
            searched.iter().map(|&(field, _)| fields.get(field)).collect(),
        );
        for (field, boost) in searched {
            parser.set_field_boost(fields.get(field), boost);
        }
        parser
    }

    /// Sorts and truncates matches according to the plan.
    fn order(&self, mut candidates: Vec<Candidate>, plan: &RankingPlan, limit: usize) -> Vec<Candidate> {
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.doc.cmp(&b.doc)));

        match plan.order {
            ResultOrder::Score => {}
            ResultOrder::PageRank => {
                candidates.sort_by(|a, b| b.pagerank.total_cmp(&a.pagerank));
            }
            ResultOrder::Blend => {
                candidates.truncate(limit.max(self.config.candidate_pool));
                blend_candidates(&mut candidates, self.config.blend);
            }
        }
        candidates.truncate(limit);
        candidates
    }

    fn materialize(
        &self,
        searcher: &Searcher,
        candidates: Vec<Candidate>,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let mut hits = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            hits.push(SearchHit {
                document: self.index.document(searcher, candidate.address)?,
                score: candidate.score,
            });
        }
        Ok(hits)
    }

    /// Replaces tantivy's scores with `weighting` summed over the query's
    /// terms, each boosted like its field.
    ///
    /// ID field terms weigh 1. Field lengths are tantivy's field norms.
    fn rescore(
        &self,
        searcher: &Searcher,
        query: &dyn Query,
        candidates: &mut [Candidate],
        weighting: Weighting,
        boosts: &FieldBoosts,
    ) -> Result<(), SearchError> {
        let mut terms: HashSet<Term> = HashSet::new();
        query.query_terms(&mut |term: &Term, _: bool| {
            terms.insert(term.clone());
        });

        let mut slots = CandidateSlots::new();
        for (slot, candidate) in candidates.iter_mut().enumerate() {
            candidate.score = 0.0;
            slots
                .entry(candidate.address.segment_ord)
                .or_default()
                .insert(candidate.address.doc_id, slot);
        }

        let doc_count = searcher.num_docs() as f64;
        for term in &terms {
            let Some(field) = self.index.fields().field_of(term.field()) else {
                continue;
            };
            let occurrences = self.term_occurrences(searcher, term, &slots)?;
            if field.is_id() {
                for hit in &occurrences.hits {
                    candidates[hit.slot].score += 1.0;
                }
                continue;
            }

            let stats = TermStats {
                doc_count,
                doc_freq: searcher.doc_freq(term)? as f64,
                coll_freq: occurrences.coll_freq,
                avg_field_length: f64::from(self.index.average_field_length(field)),
            };
            let boost = f64::from(boosts.boost(field).unwrap_or(1.0));
            for hit in &occurrences.hits {
                candidates[hit.slot].score += boost * weighting.score(hit.tf, hit.field_length, &stats);
            }
        }
        Ok(())
    }

    /// Walks the postings of `term` in every segment.
    fn term_occurrences(
        &self,
        searcher: &Searcher,
        term: &Term,
        slots: &CandidateSlots,
    ) -> Result<TermOccurrences, SearchError> {
        let mut occurrences = TermOccurrences::default();
        for (ord, segment) in searcher.segment_readers().iter().enumerate() {
            let inverted = segment.inverted_index(term.field())?;
            let Some(mut postings) = inverted.read_postings(term, IndexRecordOption::WithFreqs)?
            else {
                continue;
            };
            let norms = segment.get_fieldnorms_reader(term.field())?;
            let wanted = slots.get(&(ord as SegmentOrdinal));

            let mut doc = postings.doc();
            while doc != TERMINATED {
                let tf = f64::from(postings.term_freq());
                occurrences.coll_freq += tf;
                if let Some(&slot) = wanted.and_then(|docs| docs.get(&doc)) {
                    occurrences.hits.push(TermHit {
                        slot,
                        tf,
                        field_length: f64::from(norms.fieldnorm(doc)),
                    });
                }
                doc = postings.advance();
            }
        }
        Ok(occurrences)
    }
}

/// One term's total frequency and its occurrences among the candidates.
#[derive(Debug, Default)]
struct TermOccurrences {
    coll_freq: f64,
    hits: Vec<TermHit>,
}

#[derive(Debug)]
struct TermHit {
    slot: usize,
    tf: f64,
    field_length: f64,
}
