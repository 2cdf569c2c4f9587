//! Collects every match of a query together with its fast fields.

use super::blend::Candidate;
use crate::index::{ORDINAL_FIELD, PAGERANK_FIELD};
use tantivy::collector::{Collector, SegmentCollector};
use tantivy::columnar::Column;
use tantivy::{DocAddress, DocId, Score, SegmentOrdinal, SegmentReader};

/// Unlike `TopDocs`, keeps all matches: the `pagerank` order and the
/// custom blend look past the lexical top-k.
pub(crate) struct MatchCollector;

impl Collector for MatchCollector {
    type Fruit = Vec<Candidate>;
    type Child = MatchSegmentCollector;

    fn for_segment(
        &self,
        segment_local_id: SegmentOrdinal,
        segment: &SegmentReader,
    ) -> tantivy::Result<MatchSegmentCollector> {
        let fast_fields = segment.fast_fields();
        Ok(MatchSegmentCollector {
            segment: segment_local_id,
            ordinals: fast_fields.u64(ORDINAL_FIELD)?,
            pageranks: fast_fields.f64(PAGERANK_FIELD)?,
            matches: Vec::new(),
        })
    }

    fn requires_scoring(&self) -> bool {
        true
    }

    fn merge_fruits(&self, fruits: Vec<Vec<Candidate>>) -> tantivy::Result<Vec<Candidate>> {
        Ok(fruits.into_iter().flatten().collect())
    }
}

pub(crate) struct MatchSegmentCollector {
    segment: SegmentOrdinal,
    ordinals: Column<u64>,
    pageranks: Column<f64>,
    matches: Vec<Candidate>,
}

impl SegmentCollector for MatchSegmentCollector {
    type Fruit = Vec<Candidate>;

    fn collect(&mut self, doc: DocId, score: Score) {
        self.matches.push(Candidate {
            address: DocAddress::new(self.segment, doc),
            doc: self.ordinals.first(doc).unwrap_or(u64::from(doc)),
            score: f64::from(score),
            pagerank: self.pageranks.first(doc).unwrap_or(0.0),
        });
    }

    fn harvest(self) -> Vec<Candidate> {
        self.matches
    }
}
