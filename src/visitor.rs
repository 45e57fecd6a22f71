use roaring::RoaringBitmap;

use crate::cursor::{BoxRelation, PointVisitor};
use crate::distance::packed_box_distance_sq;
use crate::hits::HitQueue;
use crate::sortable::{decode_dim, BYTES_PER_DIM};
use crate::DocId;

/// Accumulates the best hits while leaf cells stream their points through it.
///
/// The visitor owns the dynamic pruning radius: once the hit queue is full,
/// `bottom_distance_sq` is the squared distance of the worst accepted hit and
/// nothing farther can enter the results anymore.
pub(crate) struct NearestVisitor<'a> {
    origin: &'a [f32],
    hits: HitQueue,
    cur_doc_base: DocId,
    cur_live_docs: Option<&'a RoaringBitmap>,
    bottom_distance_sq: f64,
    bottom_doc_id: DocId,
}

impl<'a> NearestVisitor<'a> {
    pub(crate) fn new(origin: &'a [f32], count: usize) -> NearestVisitor<'a> {
        NearestVisitor {
            origin,
            hits: HitQueue::new(count),
            cur_doc_base: 0,
            cur_live_docs: None,
            bottom_distance_sq: f64::INFINITY,
            bottom_doc_id: DocId::MAX,
        }
    }

    /// Points the subsequent leaf visits at the segment owning the leaf.
    pub(crate) fn enter_segment(&mut self, doc_base: DocId, live_docs: Option<&'a RoaringBitmap>) {
        self.cur_doc_base = doc_base;
        self.cur_live_docs = live_docs;
    }

    /// The current pruning radius, squared. Infinite until the queue fills.
    pub(crate) fn bottom_distance_sq(&self) -> f64 {
        self.bottom_distance_sq
    }

    pub(crate) fn into_hits(self) -> HitQueue {
        self.hits
    }

    fn refresh_bottom(&mut self) {
        if self.hits.is_full() {
            if let Some(worst) = self.hits.worst() {
                self.bottom_distance_sq = worst.distance_sq();
                self.bottom_doc_id = worst.doc_id();
            }
        }
    }
}

impl PointVisitor for NearestVisitor<'_> {
    fn visit(&mut self, doc_id: DocId, packed_point: &[u8]) {
        if let Some(live_docs) = self.cur_live_docs {
            if !live_docs.contains(doc_id) {
                return;
            }
        }

        // Incremental distance with an early exit once the partial sum passes
        // the pruning radius. Strictly greater only: an exact tie must still
        // reach the doc id tie-break below.
        let mut distance_sq = 0.0;
        for (dim, &coord) in self.origin.iter().enumerate() {
            let stored = f64::from(decode_dim(packed_point, dim * BYTES_PER_DIM));
            let diff = f64::from(coord) - stored;
            distance_sq += diff * diff;
            if distance_sq > self.bottom_distance_sq {
                return;
            }
        }

        let doc_id = self.cur_doc_base + doc_id;
        if self.hits.is_full()
            && distance_sq == self.bottom_distance_sq
            && doc_id > self.bottom_doc_id
        {
            // The worst accepted hit is equidistant with a smaller doc id and
            // therefore wins the tie.
            return;
        }

        self.hits.offer(doc_id, distance_sq);
        self.refresh_bottom();
    }

    fn compare(&mut self, min_packed: &[u8], max_packed: &[u8]) -> BoxRelation {
        if self.hits.is_full()
            && packed_box_distance_sq(min_packed, max_packed, self.origin) > self.bottom_distance_sq
        {
            return BoxRelation::Outside;
        }
        BoxRelation::Crosses
    }
}
